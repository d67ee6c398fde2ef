use crate::api::{ApiError, ErrorResponse};
use crate::auth::{authenticate, safe_next, session_cookie, start_session};
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::Redirect,
    Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct LoginPageParams {
    /// Path to return to after logging in
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginPage {
    /// Where a successful login will redirect
    pub next: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[utoipa::path(
    get,
    path = "/login",
    tag = "auth",
    params(LoginPageParams),
    responses(
        (status = 200, description = "Login form", body = LoginPage)
    )
)]
pub async fn login_page(Query(params): Query<LoginPageParams>) -> Json<LoginPage> {
    Json(LoginPage {
        next: safe_next(params.next.as_deref()).to_string(),
        fields: vec!["username".to_string(), "password".to_string()],
    })
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Logged in; session cookie set, redirect to next"),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), ApiError> {
    let user = authenticate(&state, &form.username, &form.password)?.ok_or_else(|| {
        tracing::info!(username = %form.username, "login failed");
        ApiError::InvalidCredentials
    })?;

    let token = start_session(&state, &user)?;
    let target = safe_next(form.next.as_deref());
    tracing::info!(username = %user.username, next = %target, "logged in");

    Ok((jar.add(session_cookie(token, state.config.secure_cookies)), Redirect::to(target)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body(content = LoginRequest, example = json!({"username": "user", "password": "password"})),
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn api_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = authenticate(&state, &req.username, &req.password)?
        .ok_or(ApiError::InvalidCredentials)?;

    let token = start_session(&state, &user)?;

    Ok(Json(LoginResponse { token }))
}
