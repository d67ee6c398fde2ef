use crate::AppState;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use super::extractor::CurrentUser;
use super::session::{login_redirect, request_token, user_for_token};

/// Middleware for routes that need a logged-in user.
///
/// Callers without a valid session are redirected to the login page with
/// `next` set to the path they asked for. Otherwise the user is attached to
/// the request as a `CurrentUser`.
pub async fn require_login(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let user = request_token(request.headers(), &jar).and_then(|token| user_for_token(&state, &token));

    let Some(user) = user else {
        tracing::debug!(path = %request.uri().path(), "unauthenticated request, redirecting to login");
        return login_redirect(request.uri()).into_response();
    };

    request.extensions_mut().insert(CurrentUser(user));
    next.run(request).await
}
