// Database models for Diesel
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use shared_types::{EventFields, ValidEvent};

/// Insertable struct for events seen for the first time
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::calendar_events)]
pub struct NewCalendarEvent {
    pub calendar_id: String,
    pub event_id: String,
    pub summary: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl From<&ValidEvent> for NewCalendarEvent {
    fn from(event: &ValidEvent) -> Self {
        NewCalendarEvent {
            calendar_id: event.key.calendar_id.clone(),
            event_id: event.key.event_id.clone(),
            summary: event.fields.summary.clone(),
            description: event.fields.description.clone(),
            start_time: event.fields.start_time,
            end_time: event.fields.end_time,
        }
    }
}

/// The mutable columns, written together in one UPDATE.
/// The natural key columns never change once inserted.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::schema::calendar_events)]
pub struct CalendarEventChanges {
    pub summary: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&EventFields> for CalendarEventChanges {
    fn from(fields: &EventFields) -> Self {
        CalendarEventChanges {
            summary: fields.summary.clone(),
            description: fields.description.clone(),
            start_time: fields.start_time,
            end_time: fields.end_time,
            updated_at: Utc::now(),
        }
    }
}
