//! Session extraction for protected routes.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::AppState;

use super::jwt;
use super::types::{AuthConfig, Session};

/// Middleware that rejects requests without a valid session and makes the
/// `Session` available to handlers as a request extension.
///
/// Use with `axum::middleware::from_fn_with_state`.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match extract_session(request.headers(), &state.auth_config) {
        Ok(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Resolve the session from the cookie, falling back to a bearer token.
pub fn extract_session(headers: &HeaderMap, config: &AuthConfig) -> Result<Session, ApiError> {
    let token = extract_token_from_cookie(headers, &config.cookie_name)
        .or_else(|| extract_token_from_header(headers))
        .ok_or_else(ApiError::authentication_required)?;

    let claims = jwt::validate_token(config, &token).map_err(|e| {
        tracing::debug!("Rejected session token: {}", e);
        ApiError::authentication_required()
    })?;

    if !config.is_email_allowed(&claims.sub) {
        return Err(ApiError::Forbidden("Email not authorized".to_string()));
    }

    Ok(Session::from(claims))
}

fn extract_token_from_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;

    for cookie_str in cookie_header.split(';') {
        if let Ok(cookie) = cookie::Cookie::parse(cookie_str.trim()) {
            if cookie.name() == cookie_name {
                return Some(cookie.value().to_string());
            }
        }
    }

    None
}

fn extract_token_from_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|s| s.to_string())
}

/// Build a session cookie string. A `max_age_secs` of zero clears the cookie.
pub fn build_session_cookie(name: &str, value: &str, max_age_secs: i64) -> String {
    let secure = if std::env::var("RUST_ENV").unwrap_or_default() == "production" {
        "; Secure"
    } else {
        ""
    };
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        name, value, max_age_secs, secure
    )
}
