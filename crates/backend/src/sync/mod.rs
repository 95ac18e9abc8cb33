//! Reconciliation of the local event store against a remote calendar snapshot.
//!
//! A sync attempt fetches the complete remote snapshot, loads the complete
//! local snapshot, computes a `SyncPlan` and applies it. If either snapshot
//! cannot be obtained nothing is written.
//!
//! None of this is synchronized. Two overlapping attempts against the same
//! store can interleave their writes, so callers serialize them (see
//! `AppState::run_sync`).

pub mod plan;

pub use plan::{upsert_event, SyncPlan};

use shared_types::{EventRecord, StoredEvent, SyncOutcome, SyncReport};

use crate::error::SyncError;
use crate::provider::CalendarProvider;
use crate::repository::EventRepository;

/// Brings `store` in line with `remote`, given that `local` is the current
/// content of `store`.
pub async fn reconcile(
    store: &dyn EventRepository,
    remote: &[EventRecord],
    local: &[StoredEvent],
) -> SyncReport {
    let plan = SyncPlan::compute(remote, local);
    tracing::debug!(
        fetched = plan.fetched,
        to_delete = plan.to_delete.len(),
        to_upsert = plan.to_upsert.len(),
        skipped = plan.skipped.len(),
        "computed sync plan"
    );
    plan.apply(store).await
}

/// Runs one sync attempt, surfacing fatal failures as errors.
pub async fn try_synchronize(
    provider: &dyn CalendarProvider,
    store: &dyn EventRepository,
) -> Result<SyncOutcome, SyncError> {
    let remote = provider.fetch_events().await?;
    let local = store.list_all().await?;

    let report = reconcile(store, &remote, &local).await;
    tracing::info!("Calendar sync finished: {}", report.summary());

    if remote.is_empty() {
        Ok(SyncOutcome::NoEvents(report))
    } else {
        Ok(SyncOutcome::Synchronized(report))
    }
}

/// Runs one sync attempt. Never fails: fatal errors become `SyncOutcome::Failed`.
pub async fn synchronize(
    provider: &dyn CalendarProvider,
    store: &dyn EventRepository,
) -> SyncOutcome {
    match try_synchronize(provider, store).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Calendar sync failed: {}", e);
            SyncOutcome::Failed {
                message: e.to_string(),
            }
        }
    }
}
