use crate::api::ApiError;
use crate::auth::{cleared_session_cookie, end_session, request_token};
use crate::AppState;
use axum::{extract::State, http::HeaderMap, response::Redirect};
use axum_extra::extract::cookie::CookieJar;

#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    responses(
        (status = 303, description = "Session ended, redirect to the home page")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    if let Some(token) = request_token(&headers, &jar) {
        end_session(&state, &token)?;
    }

    Ok((jar.remove(cleared_session_cookie()), Redirect::to("/")))
}
