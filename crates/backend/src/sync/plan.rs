//! Diff computation between a remote snapshot and the local snapshot, and
//! application of the result to an `EventRepository`.

use shared_types::{
    EventRecord, InvalidRecord, NaturalKey, RecordOutcome, StoredEvent, SyncFailure,
    SyncOperation, SyncReport, ValidEvent,
};
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::repository::EventRepository;

/// Everything a sync will do, computed before the first write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Size of the remote snapshot.
    pub fetched: usize,
    /// Local keys absent from the remote snapshot, in key order.
    pub to_delete: Vec<NaturalKey>,
    /// One entry per distinct valid remote key, in first-seen order.
    /// A key repeated in the snapshot carries its last occurrence.
    pub to_upsert: Vec<ValidEvent>,
    pub skipped: Vec<InvalidRecord>,
}

impl SyncPlan {
    pub fn compute(remote: &[EventRecord], local: &[StoredEvent]) -> Self {
        // Invalid records with a derivable key still count as present remotely.
        let remote_keys: HashSet<NaturalKey> =
            remote.iter().filter_map(EventRecord::natural_key).collect();

        let to_delete: Vec<NaturalKey> = local
            .iter()
            .map(StoredEvent::natural_key)
            .filter(|key| !remote_keys.contains(key))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut to_upsert: Vec<ValidEvent> = Vec::new();
        let mut positions: HashMap<NaturalKey, usize> = HashMap::new();
        let mut skipped = Vec::new();

        for record in remote {
            match record.validate() {
                Ok(event) => match positions.get(&event.key) {
                    Some(&index) => {
                        tracing::warn!(key = %event.key, "duplicate event in remote snapshot, keeping last");
                        to_upsert[index] = event;
                    }
                    None => {
                        positions.insert(event.key.clone(), to_upsert.len());
                        to_upsert.push(event);
                    }
                },
                Err(invalid) => skipped.push(invalid),
            }
        }

        SyncPlan {
            fetched: remote.len(),
            to_delete,
            to_upsert,
            skipped,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_upsert.is_empty()
    }

    /// Applies deletions, then upserts. Each record is independent: a failing
    /// write is recorded in the report and the rest of the batch continues.
    pub async fn apply(&self, store: &dyn EventRepository) -> SyncReport {
        let mut report = SyncReport {
            fetched: self.fetched,
            ..SyncReport::default()
        };

        for key in &self.to_delete {
            report.record(delete_event(store, key).await);
        }

        for invalid in &self.skipped {
            tracing::debug!("skipping invalid remote record: {}", invalid);
            report.record(RecordOutcome::SkippedInvalid {
                key: invalid.key.clone(),
                missing: invalid.missing.clone(),
            });
        }

        for event in &self.to_upsert {
            report.record(upsert_event(store, event).await);
        }

        report
    }
}

async fn delete_event(store: &dyn EventRepository, key: &NaturalKey) -> RecordOutcome {
    match store.delete(key).await {
        Ok(true) => {
            tracing::debug!(%key, "deleted event no longer present remotely");
            RecordOutcome::Deleted
        }
        Ok(false) => RecordOutcome::AlreadyAbsent,
        Err(e) => {
            tracing::warn!(%key, error = %e, "failed to delete event");
            store_failure(key, SyncOperation::Delete, e)
        }
    }
}

/// Creates the event, or overwrites its mutable fields if the key is already
/// stored. Unchanged events are not written.
pub async fn upsert_event(store: &dyn EventRepository, event: &ValidEvent) -> RecordOutcome {
    let existing = match store.find_by_natural_key(&event.key).await {
        Ok(existing) => existing,
        Err(e) => {
            tracing::warn!(key = %event.key, error = %e, "failed to look up event");
            return store_failure(&event.key, SyncOperation::Update, e);
        }
    };

    match existing {
        Some(stored) if stored.fields() == event.fields => RecordOutcome::Unchanged,
        Some(stored) => match store.update(stored.id, &event.fields).await {
            Ok(_) => {
                tracing::debug!(key = %event.key, "updated event");
                RecordOutcome::Updated
            }
            Err(e) => {
                tracing::warn!(key = %event.key, error = %e, "failed to update event");
                store_failure(&event.key, SyncOperation::Update, e)
            }
        },
        None => match store.insert(event).await {
            Ok(_) => {
                tracing::debug!(key = %event.key, "created event");
                RecordOutcome::Created
            }
            Err(e) => {
                tracing::warn!(key = %event.key, error = %e, "failed to create event");
                store_failure(&event.key, SyncOperation::Create, e)
            }
        },
    }
}

fn store_failure(
    key: &NaturalKey,
    operation: SyncOperation,
    error: impl std::fmt::Display,
) -> RecordOutcome {
    RecordOutcome::StoreFailed(SyncFailure {
        key: key.clone(),
        operation,
        message: error.to_string(),
    })
}
