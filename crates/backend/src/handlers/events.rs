use axum::{
    extract::{Path, State},
    Json,
};
use shared_types::StoredEvent;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Stored events ordered by start time.
pub async fn list_events(State(state): State<AppState>) -> ApiResult<Json<Vec<StoredEvent>>> {
    let events = state.events.list_all().await?;
    Ok(Json(events))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<StoredEvent>> {
    state
        .events
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Event"))
}
