//! Sync results as seen by callers of the reconciler and the `/api/sync` endpoint.

use serde::{Deserialize, Serialize};

use crate::NaturalKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    Create,
    Update,
    Delete,
}

impl SyncOperation {
    pub fn as_str(&self) -> &str {
        match self {
            SyncOperation::Create => "create",
            SyncOperation::Update => "update",
            SyncOperation::Delete => "delete",
        }
    }
}

/// A single store mutation that failed during a sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFailure {
    pub key: NaturalKey,
    pub operation: SyncOperation,
    pub message: String,
}

/// What happened to one record while applying a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Created,
    Updated,
    /// The stored copy already matched the remote record; nothing was written.
    Unchanged,
    Deleted,
    /// The record was gone by the time it was deleted.
    AlreadyAbsent,
    SkippedInvalid {
        key: Option<NaturalKey>,
        missing: Vec<&'static str>,
    },
    StoreFailed(SyncFailure),
}

/// Per-outcome counts for one sync attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Number of records in the remote snapshot, valid or not.
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub deleted: usize,
    pub skipped_invalid: usize,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    pub fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Created => self.created += 1,
            RecordOutcome::Updated => self.updated += 1,
            RecordOutcome::Unchanged => self.unchanged += 1,
            RecordOutcome::Deleted => self.deleted += 1,
            RecordOutcome::AlreadyAbsent => {}
            RecordOutcome::SkippedInvalid { .. } => self.skipped_invalid += 1,
            RecordOutcome::StoreFailed(failure) => self.failures.push(failure),
        }
    }

    /// Total number of writes that reached the store.
    pub fn mutations(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} created, {} updated, {} deleted, {} unchanged, {} skipped",
            self.created, self.updated, self.deleted, self.unchanged, self.skipped_invalid
        );
        if !self.failures.is_empty() {
            summary.push_str(&format!(", {} failed", self.failures.len()));
        }
        summary
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Synchronized,
    NoEvents,
    Failed,
}

impl SyncStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SyncStatus::Synchronized => "synchronized",
            SyncStatus::NoEvents => "no_events",
            SyncStatus::Failed => "failed",
        }
    }
}

/// Result of one full sync attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The remote snapshot had events and was applied.
    Synchronized(SyncReport),
    /// The remote snapshot was empty. Local events may still have been drained.
    NoEvents(SyncReport),
    /// Nothing was applied.
    Failed { message: String },
}

impl SyncOutcome {
    pub fn status(&self) -> SyncStatus {
        match self {
            SyncOutcome::Synchronized(_) => SyncStatus::Synchronized,
            SyncOutcome::NoEvents(_) => SyncStatus::NoEvents,
            SyncOutcome::Failed { .. } => SyncStatus::Failed,
        }
    }

    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            SyncOutcome::Synchronized(report) | SyncOutcome::NoEvents(report) => Some(report),
            SyncOutcome::Failed { .. } => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            SyncOutcome::Synchronized(_) => "Events synchronized successfully.".to_string(),
            SyncOutcome::NoEvents(_) => "No events found to synchronize.".to_string(),
            SyncOutcome::Failed { message } => {
                format!("An error occurred while syncing events: {}", message)
            }
        }
    }
}

/// Response body of `POST /api/sync`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResponse {
    pub status: SyncStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<SyncReport>,
}

impl From<SyncOutcome> for SyncResponse {
    fn from(outcome: SyncOutcome) -> Self {
        SyncResponse {
            status: outcome.status(),
            message: outcome.message(),
            report: outcome.report().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_outcomes() {
        let mut report = SyncReport::default();
        report.record(RecordOutcome::Created);
        report.record(RecordOutcome::Created);
        report.record(RecordOutcome::Updated);
        report.record(RecordOutcome::Unchanged);
        report.record(RecordOutcome::AlreadyAbsent);
        report.record(RecordOutcome::SkippedInvalid {
            key: None,
            missing: vec!["event_id"],
        });
        report.record(RecordOutcome::StoreFailed(SyncFailure {
            key: NaturalKey::new("cal_1", "event_1"),
            operation: SyncOperation::Update,
            message: "connection reset".to_string(),
        }));

        assert_eq!(report.created, 2);
        assert_eq!(report.updated, 1);
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.deleted, 0);
        assert_eq!(report.skipped_invalid, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.mutations(), 3);
        assert_eq!(
            report.summary(),
            "2 created, 1 updated, 0 deleted, 1 unchanged, 1 skipped, 1 failed"
        );
    }

    #[test]
    fn test_outcome_messages() {
        let ok = SyncOutcome::Synchronized(SyncReport::default());
        assert_eq!(ok.message(), "Events synchronized successfully.");

        let empty = SyncOutcome::NoEvents(SyncReport::default());
        assert_eq!(empty.message(), "No events found to synchronize.");

        let failed = SyncOutcome::Failed {
            message: "Some error".to_string(),
        };
        assert_eq!(
            failed.message(),
            "An error occurred while syncing events: Some error"
        );
        assert!(failed.report().is_none());
    }

    #[test]
    fn test_response_serializes_status() {
        let response = SyncResponse::from(SyncOutcome::NoEvents(SyncReport::default()));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "no_events");
        assert_eq!(json["report"]["deleted"], 0);

        let failed = SyncResponse::from(SyncOutcome::Failed {
            message: "boom".to_string(),
        });
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert!(json.get("report").is_none());
    }
}
