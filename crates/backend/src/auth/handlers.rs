//! Authentication HTTP handlers.

use axum::extract::Query;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::Duration;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::provider::AccessToken;
use crate::AppState;

use super::{
    build_session_cookie, extract_session, jwt,
    types::{AuthUserResponse, LoginInitResponse},
};

/// Redirect the browser straight to Google's consent screen.
pub async fn auth_google(State(state): State<AppState>) -> Redirect {
    let csrf_state = uuid::Uuid::new_v4().to_string();
    Redirect::to(&state.oauth.authorization_url(&csrf_state))
}

/// Start Google OAuth login flow.
///
/// Returns the consent URL for clients that cannot follow a redirect.
pub async fn auth_login(State(state): State<AppState>) -> ApiResult<Json<LoginInitResponse>> {
    let csrf_state = uuid::Uuid::new_v4().to_string();
    Ok(Json(LoginInitResponse {
        auth_url: state.oauth.authorization_url(&csrf_state),
    }))
}

#[derive(Debug, Deserialize)]
pub struct AuthCallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// Handle Google OAuth callback.
///
/// Exchanges the authorization code for tokens, checks the allowlist and
/// stores the access token in the session cookie.
pub async fn auth_callback(
    State(state): State<AppState>,
    Query(params): Query<AuthCallbackParams>,
) -> Response {
    match handle_callback_inner(&state, params).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Auth callback error: {:?}", e);
            e.into_response()
        }
    }
}

async fn handle_callback_inner(
    state: &AppState,
    params: AuthCallbackParams,
) -> Result<Response, ApiError> {
    let config = &state.auth_config;

    if let Some(error) = params.error {
        tracing::warn!("Google denied authorization: {}", error);
        return Err(ApiError::authentication_required());
    }
    let code = params
        .code
        .ok_or_else(|| ApiError::bad_request("missing authorization code"))?;

    let tokens = state.oauth.exchange_code(&code).await.map_err(|e| {
        tracing::error!("Token exchange failed: {}", e);
        ApiError::authentication_required()
    })?;
    let access_token = AccessToken::new(tokens.access_token);

    let user_info = state
        .oauth
        .user_info(&access_token)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to get user info: {}", e)))?;

    tracing::info!("OAuth login attempt from: {}", user_info.email);

    if !config.is_email_allowed(&user_info.email) {
        tracing::warn!("Unauthorized login attempt from: {}", user_info.email);
        return Err(ApiError::Forbidden("Email not authorized".to_string()));
    }

    if tokens.refresh_token.is_some() {
        tracing::info!(
            "Google issued a refresh token for {}; set GOOGLE_REFRESH_TOKEN to enable background sync",
            user_info.email
        );
    }

    let lifetime_secs = tokens.expires_in.unwrap_or(config.default_session_secs);
    let token = jwt::create_token(
        config,
        &user_info.email,
        user_info.name,
        &access_token,
        Duration::seconds(lifetime_secs),
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to create token: {}", e)))?;

    let cookie = build_session_cookie(&config.cookie_name, &token, lifetime_secs);

    tracing::info!("Successful login for: {}", user_info.email);

    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/api/events"),
            (header::SET_COOKIE, cookie.as_str()),
        ],
    )
        .into_response())
}

/// Get current authenticated user info.
pub async fn auth_me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match extract_session(&headers, &state.auth_config) {
        Ok(session) => Json(AuthUserResponse {
            email: session.email,
            name: session.name,
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}

/// Logout - clear session cookie.
pub async fn auth_logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = build_session_cookie(&state.auth_config.cookie_name, "", 0);

    (StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)])
}
