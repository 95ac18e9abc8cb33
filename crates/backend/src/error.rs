//! Unified error handling for the backend.
//!
//! `ApiError` implements `IntoResponse`, allowing handlers to use `?`
//! naturally while returning appropriate HTTP status codes. The sync core
//! has its own error types: `ProviderError` for the remote side,
//! `StoreError` for the local side and `SyncError` for a whole attempt.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use diesel_async::pooled_connection::deadpool::PoolError;
use serde::Serialize;
use thiserror::Error;

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Failure reaching or understanding the calendar provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network, TLS or timeout failure
    #[error("request to calendar provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider refused the credential
    #[error("calendar provider rejected the credential ({0})")]
    Unauthorized(String),

    /// Any other non-success status
    #[error("calendar provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The body did not have the expected shape
    #[error("malformed response from calendar provider: {0}")]
    Malformed(String),

    /// No usable credential could be obtained
    #[error("{0}")]
    Unavailable(String),
}

/// Failure of a single operation against the local event store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database connection unavailable: {0}")]
    Connection(#[from] PoolError),

    #[error("database error: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("{0}")]
    Rejected(String),
}

/// A sync attempt that could not run at all. Nothing was written.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("could not load local events: {0}")]
    Store(#[from] StoreError),
}

/// Unified error type for API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Event store error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Generic internal error
    #[error("{0}")]
    Internal(#[from] anyhow::Error),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Authentication required but not provided or invalid
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not permitted
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl ApiError {
    /// Create a not found error with a custom message
    pub fn not_found(resource: impl Into<String>) -> Self {
        ApiError::NotFound(resource.into())
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    /// The response sent whenever a sync is attempted without a usable credential
    pub fn authentication_required() -> Self {
        ApiError::Unauthorized("You need to authenticate first.".to_string())
    }
}

impl From<PoolError> for ApiError {
    fn from(err: PoolError) -> Self {
        ApiError::Store(StoreError::Connection(err))
    }
}

impl From<diesel::result::Error> for ApiError {
    fn from(err: diesel::result::Error) -> Self {
        ApiError::Store(StoreError::Query(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match &self {
            ApiError::Store(StoreError::Connection(e)) => {
                tracing::error!("Connection pool error: {:?}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Database connection unavailable".to_string(),
                    None,
                )
            }
            ApiError::Store(StoreError::Query(diesel::result::Error::NotFound)) => (
                StatusCode::NOT_FOUND,
                "Resource not found".to_string(),
                None,
            ),
            ApiError::Store(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database operation failed".to_string(),
                    None,
                )
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Some(e.to_string()),
                )
            }
            ApiError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                format!("{} not found", resource),
                None,
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
