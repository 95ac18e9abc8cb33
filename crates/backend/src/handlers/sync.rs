use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use shared_types::{SyncOutcome, SyncResponse};

use crate::auth::Session;
use crate::error::{ApiError, ApiResult, SyncError};
use crate::sync;
use crate::AppState;

/// Run one full reconcile for the session's Google account.
///
/// 200 when the snapshot was applied (even with per-record failures, which are
/// listed in the report), 401 when Google no longer accepts the session's
/// token, 502 when the events could not be fetched and 500 when the local
/// events could not be loaded.
pub async fn trigger_sync(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<impl IntoResponse> {
    let provider = state.connector.connect(session.access_token);
    if !provider.validate_credential().await {
        tracing::info!("Sync refused for {}: credential no longer valid", session.email);
        return Err(ApiError::authentication_required());
    }

    tracing::info!("Sync triggered by {}", session.email);
    let result = {
        let _guard = state.lock_sync().await;
        sync::try_synchronize(provider.as_ref(), state.events.as_ref()).await
    };

    let (status, outcome) = match result {
        Ok(outcome) => (StatusCode::OK, outcome),
        Err(e) => {
            tracing::error!("Calendar sync failed: {}", e);
            let status = match e {
                SyncError::Provider(_) => StatusCode::BAD_GATEWAY,
                SyncError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                SyncOutcome::Failed {
                    message: e.to_string(),
                },
            )
        }
    };

    Ok((status, Json(SyncResponse::from(outcome))))
}
