//! Auth-related types and configuration.

use serde::{Deserialize, Serialize};

use crate::provider::AccessToken;

// Re-export shared types for convenience
pub use shared_types::{AuthUserResponse, LoginInitResponse};

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user email)
    pub sub: String,
    /// User display name from Google
    pub name: Option<String>,
    /// Google access token used for calendar requests
    pub access_token: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Validated session from JWT
#[derive(Debug, Clone)]
pub struct Session {
    pub email: String,
    pub name: Option<String>,
    pub access_token: AccessToken,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Session {
            email: claims.sub,
            name: claims.name,
            access_token: AccessToken::new(claims.access_token),
        }
    }
}

/// Auth configuration loaded from environment
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Empty means any Google account may log in.
    pub allowed_emails: Vec<String>,
    /// Used when Google does not report the access token lifetime.
    pub default_session_secs: i64,
    pub cookie_name: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub auth_redirect_uri: String,
}

impl AuthConfig {
    /// Load auth configuration from environment variables.
    ///
    /// Required env vars:
    /// - `JWT_SECRET`: Secret key for signing session tokens
    /// - `GOOGLE_CLIENT_ID`: Google OAuth client ID
    /// - `GOOGLE_CLIENT_SECRET`: Google OAuth client secret
    /// - `AUTH_REDIRECT_URI`: OAuth callback URI
    ///
    /// Optional: `ALLOWED_EMAILS`, a comma-separated allowlist.
    pub fn from_env() -> Result<Self, String> {
        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set".to_string())?;

        let allowed_emails: Vec<String> = std::env::var("ALLOWED_EMAILS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            jwt_secret,
            allowed_emails,
            default_session_secs: 3600,
            cookie_name: "calmirror_session".to_string(),
            google_client_id: std::env::var("GOOGLE_CLIENT_ID")
                .map_err(|_| "GOOGLE_CLIENT_ID must be set".to_string())?,
            google_client_secret: std::env::var("GOOGLE_CLIENT_SECRET")
                .map_err(|_| "GOOGLE_CLIENT_SECRET must be set".to_string())?,
            auth_redirect_uri: std::env::var("AUTH_REDIRECT_URI")
                .map_err(|_| "AUTH_REDIRECT_URI must be set".to_string())?,
        })
    }

    /// Check if an email address may log in.
    pub fn is_email_allowed(&self, email: &str) -> bool {
        self.allowed_emails.is_empty() || self.allowed_emails.contains(&email.to_lowercase())
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "test-secret-key-for-testing-only".to_string(),
        allowed_emails: vec!["test@example.com".to_string()],
        default_session_secs: 3600,
        cookie_name: "calmirror_session".to_string(),
        google_client_id: "test".to_string(),
        google_client_secret: "test".to_string(),
        auth_redirect_uri: "http://localhost/auth/callback".to_string(),
    }
}
