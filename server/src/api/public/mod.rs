pub mod auth;
pub mod home;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for public endpoints (no login required)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route(
            crate::auth::LOGIN_PATH,
            get(auth::login::login_page).post(auth::login::login),
        )
        .route("/logout", post(auth::logout::logout))
        .route("/api/auth/login", post(auth::login::api_login))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        home::home,
        auth::login::login_page,
        auth::login::login,
        auth::login::api_login,
        auth::logout::logout,
    ),
    components(schemas(
        home::HomeResponse,
        home::Link,
        auth::login::LoginPage,
        auth::login::LoginForm,
        auth::login::LoginRequest,
        auth::login::LoginResponse,
    ))
)]
pub struct ApiDoc;
