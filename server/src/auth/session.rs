use crate::models::User;
use crate::store::StoreError;
use crate::AppState;
use axum::http::{header, HeaderMap, Uri};
use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;

use super::crypto::{generate_token, hash_password, hash_token, verify_password};

pub const SESSION_COOKIE: &str = "sessionid";
pub const LOGIN_PATH: &str = "/login";
/// Where a successful login lands when no usable `next` was given.
pub const DEFAULT_REDIRECT: &str = "/list";

/// Create a session for `user` and return the raw token to hand to the client.
pub fn start_session(state: &AppState, user: &User) -> Result<String, StoreError> {
    let token = generate_token();
    let expires_at = Utc::now() + state.config.session_ttl;
    state
        .store
        .create_session(user.id, &hash_token(&token), expires_at)?;
    Ok(token)
}

pub fn end_session(state: &AppState, token: &str) -> Result<(), StoreError> {
    state.store.delete_session(&hash_token(token))
}

/// Store failures are logged and treated as "not logged in".
pub fn user_for_token(state: &AppState, token: &str) -> Option<User> {
    match state.store.user_for_session(&hash_token(token), Utc::now()) {
        Ok(user) => user,
        Err(e) => {
            tracing::error!(error = %e, "session lookup failed");
            None
        }
    }
}

/// `Ok(None)` means the username or password was wrong.
pub fn authenticate(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<Option<User>, StoreError> {
    let Some(user) = state.store.find_user_by_username(username)? else {
        return Ok(None);
    };

    if verify_password(password, &user.password_hash) {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/// Hash `password` with the configured argon2 parameters and insert the user.
pub fn register_user(state: &AppState, username: &str, password: &str) -> anyhow::Result<User> {
    let password_hash = hash_password(password, state.config.insecure_password_hashing)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;
    Ok(state.store.create_user(username, &password_hash)?)
}

/// Session cookie first, then `Authorization: Bearer`.
pub fn request_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// `secure` restricts the cookie to HTTPS; set it when served behind TLS.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub fn cleared_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// Redirect to the login page, remembering where the caller wanted to go.
pub fn login_redirect(uri: &Uri) -> Redirect {
    let next = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    Redirect::to(&format!("{}?{}", LOGIN_PATH, query))
}

/// Only local absolute paths are followed after login; anything that could
/// leave the site falls back to the default page.
pub fn safe_next(next: Option<&str>) -> &str {
    match next.map(str::trim) {
        Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => n,
        _ => DEFAULT_REDIRECT,
    }
}
