use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

mod report;

pub use report::{
    RecordOutcome, SyncFailure, SyncOperation, SyncOutcome, SyncReport, SyncResponse, SyncStatus,
};

/// The `(calendar_id, event_id)` pair identifying an event on both sides of a sync.
///
/// Provider event ids are only unique within a calendar, so neither half is an
/// identity on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NaturalKey {
    pub calendar_id: String,
    pub event_id: String,
}

impl NaturalKey {
    pub fn new(calendar_id: impl Into<String>, event_id: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            event_id: event_id.into(),
        }
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.calendar_id, self.event_id)
    }
}

/// An event as reported by the remote provider, normalized but not yet validated.
///
/// Absent fields are `None`, never empty strings, so validity is unambiguous.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub calendar_id: Option<String>,
    pub event_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// The fields a sync is allowed to overwrite on a stored event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFields {
    pub summary: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// A remote record that passed validation: every required field is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEvent {
    pub key: NaturalKey,
    pub fields: EventFields,
}

/// Why a remote record cannot be created or updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRecord {
    /// Present when both key halves were supplied. Such a record still shields
    /// its local counterpart from deletion.
    pub key: Option<NaturalKey>,
    pub missing: Vec<&'static str>,
}

impl fmt::Display for InvalidRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "event {} missing {}", key, self.missing.join(", ")),
            None => write!(f, "unidentifiable event missing {}", self.missing.join(", ")),
        }
    }
}

impl EventRecord {
    /// The natural key, if both halves are present.
    pub fn natural_key(&self) -> Option<NaturalKey> {
        match (&self.calendar_id, &self.event_id) {
            (Some(calendar_id), Some(event_id)) => {
                Some(NaturalKey::new(calendar_id.clone(), event_id.clone()))
            }
            _ => None,
        }
    }

    /// Checks every required field and returns either the complete event or the
    /// list of missing fields.
    pub fn validate(&self) -> Result<ValidEvent, InvalidRecord> {
        let mut missing = Vec::new();
        if self.calendar_id.is_none() {
            missing.push("calendar_id");
        }
        if self.event_id.is_none() {
            missing.push("event_id");
        }
        if self.summary.is_none() {
            missing.push("summary");
        }
        if self.description.is_none() {
            missing.push("description");
        }
        if self.start_time.is_none() {
            missing.push("start_time");
        }
        if self.end_time.is_none() {
            missing.push("end_time");
        }

        match (
            self.natural_key(),
            &self.summary,
            &self.description,
            self.start_time,
            self.end_time,
        ) {
            (Some(key), Some(summary), Some(description), Some(start_time), Some(end_time)) => {
                Ok(ValidEvent {
                    key,
                    fields: EventFields {
                        summary: summary.clone(),
                        description: description.clone(),
                        start_time,
                        end_time,
                    },
                })
            }
            _ => Err(InvalidRecord {
                key: self.natural_key(),
                missing,
            }),
        }
    }
}

/// Stored event struct matching database column order exactly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "diesel", derive(diesel::Queryable))]
pub struct StoredEvent {
    pub id: Uuid,
    pub calendar_id: String,
    pub event_id: String,
    pub summary: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredEvent {
    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey::new(self.calendar_id.clone(), self.event_id.clone())
    }

    pub fn fields(&self) -> EventFields {
        EventFields {
            summary: self.summary.clone(),
            description: self.description.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

// Auth API types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUserResponse {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInitResponse {
    pub auth_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn complete_record() -> EventRecord {
        EventRecord {
            calendar_id: Some("cal_1".to_string()),
            event_id: Some("event_1".to_string()),
            summary: Some("Test Event 1".to_string()),
            description: Some("Description 1".to_string()),
            start_time: Some(Utc.with_ymd_and_hms(2023, 9, 15, 10, 0, 0).unwrap()),
            end_time: Some(Utc.with_ymd_and_hms(2023, 9, 15, 12, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_complete_record_is_valid() {
        let valid = complete_record().validate().expect("record should be valid");
        assert_eq!(valid.key, NaturalKey::new("cal_1", "event_1"));
        assert_eq!(valid.fields.summary, "Test Event 1");
    }

    #[test]
    fn test_missing_description_keeps_key() {
        let record = EventRecord {
            description: None,
            ..complete_record()
        };

        let invalid = record.validate().unwrap_err();
        assert_eq!(invalid.key, Some(NaturalKey::new("cal_1", "event_1")));
        assert_eq!(invalid.missing, vec!["description"]);
    }

    #[test]
    fn test_missing_event_id_has_no_key() {
        let record = EventRecord {
            event_id: None,
            start_time: None,
            ..complete_record()
        };

        let invalid = record.validate().unwrap_err();
        assert_eq!(invalid.key, None);
        assert_eq!(invalid.missing, vec!["event_id", "start_time"]);
    }

    #[test]
    fn test_empty_strings_count_as_present() {
        let record = EventRecord {
            summary: Some(String::new()),
            description: Some(String::new()),
            ..complete_record()
        };

        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_natural_key_display() {
        assert_eq!(NaturalKey::new("cal_1", "event_1").to_string(), "cal_1/event_1");
    }
}
