//! Authentication with Google OAuth login and JWT sessions.
//!
//! The session carries the user's Google access token, which is the
//! credential handed to the calendar provider when a sync is triggered.

mod handlers;
mod jwt;
mod middleware;
pub mod oauth;
pub mod types;

pub use handlers::{auth_callback, auth_google, auth_login, auth_logout, auth_me};
pub use jwt::{create_token, validate_token};
pub use middleware::{build_session_cookie, extract_session, require_session};
pub use oauth::GoogleOAuthClient;
pub use types::{AuthConfig, Session};
