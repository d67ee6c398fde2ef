use crate::models::User;
use axum::{extract::FromRequestParts, http::request::Parts, response::Redirect};

use super::session::login_redirect;

/// The logged-in user, placed in request extensions by `require_login`.
///
/// ```ignore
/// async fn my_handler(CurrentUser(user): CurrentUser) -> impl IntoResponse {
///     // user is the authenticated User
/// }
/// ```
///
/// Handlers reached without the middleware reject with the same login
/// redirect the middleware would have produced.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| login_redirect(&parts.uri))
    }
}
