//! Google OAuth 2.0 web flow.

use serde::{Deserialize, Serialize};

use super::types::AuthConfig;
use crate::error::ProviderError;
use crate::provider::{AccessToken, GoogleEndpoints};

const SCOPES: &[&str] = &[
    "openid",
    "email",
    "profile",
    "https://www.googleapis.com/auth/calendar",
];

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct GoogleUserInfo {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Serialize)]
struct CodeExchange<'a> {
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'static str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'static str,
}

/// Talks to Google's authorization, token and userinfo endpoints.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    endpoints: GoogleEndpoints,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl GoogleOAuthClient {
    pub fn new(config: &AuthConfig, endpoints: GoogleEndpoints) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoints,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_uri: config.auth_redirect_uri.clone(),
        }
    }

    /// URL the user is sent to for consent. Offline access is requested so
    /// the callback also yields a refresh token for background syncs.
    pub fn authorization_url(&self, csrf_state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}\
             &access_type=offline&include_granted_scopes=true&prompt=consent&state={}",
            self.endpoints.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&SCOPES.join(" ")),
            urlencoding::encode(csrf_state)
        )
    }

    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, ProviderError> {
        let request = CodeExchange {
            code,
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            redirect_uri: &self.redirect_uri,
            grant_type: "authorization_code",
        };
        self.post_token(&request).await
    }

    /// Trades a stored refresh token for a fresh access token.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, ProviderError> {
        let request = RefreshRequest {
            refresh_token,
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            grant_type: "refresh_token",
        };
        self.post_token(&request).await
    }

    pub async fn user_info(&self, token: &AccessToken) -> Result<GoogleUserInfo, ProviderError> {
        let response = self
            .http
            .get(&self.endpoints.userinfo_url)
            .bearer_auth(token.secret())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Unauthorized(response.status().to_string()));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))
    }

    async fn post_token<T: Serialize>(&self, form: &T) -> Result<TokenResponse, ProviderError> {
        let response = self
            .http
            .post(&self.endpoints.token_url)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Token request failed: {} - {}", status, body);
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))
    }
}
