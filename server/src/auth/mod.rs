mod crypto;
mod extractor;
mod middleware;
mod session;

pub use extractor::CurrentUser;
pub use middleware::require_login;
pub use session::{
    authenticate, cleared_session_cookie, end_session, register_user, request_token, safe_next,
    session_cookie, start_session, LOGIN_PATH, SESSION_COOKIE,
};
