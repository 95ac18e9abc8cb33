//! Repository abstraction over the local event store.
//!
//! The reconciler only talks to `EventRepository`. `PgEventRepository` is the
//! production implementation; `InMemoryEventRepository` keeps the same
//! unique-key contract in a `BTreeMap` and is used by tests.

use async_trait::async_trait;
use chrono::Utc;
use shared_types::{EventFields, NaturalKey, StoredEvent, ValidEvent};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

use crate::db::{self, DbPool};
use crate::error::StoreError;
use crate::models::{CalendarEventChanges, NewCalendarEvent};

/// Persistent store of mirrored events, keyed by natural key.
///
/// Implementations must never hold two events with the same natural key.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Full local snapshot.
    async fn list_all(&self) -> Result<Vec<StoredEvent>, StoreError>;

    async fn find_by_natural_key(&self, key: &NaturalKey)
        -> Result<Option<StoredEvent>, StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<StoredEvent>, StoreError>;

    async fn insert(&self, event: &ValidEvent) -> Result<StoredEvent, StoreError>;

    /// Overwrites the four mutable fields of an existing event in one write.
    async fn update(&self, id: Uuid, fields: &EventFields) -> Result<StoredEvent, StoreError>;

    /// Returns `false` if there was nothing to delete.
    async fn delete(&self, key: &NaturalKey) -> Result<bool, StoreError>;
}

/// PostgreSQL-backed repository.
#[derive(Clone)]
pub struct PgEventRepository {
    pool: DbPool,
}

impl PgEventRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn list_all(&self) -> Result<Vec<StoredEvent>, StoreError> {
        let mut conn = self.pool.get().await?;
        Ok(db::calendar_events::list_all(&mut conn).await?)
    }

    async fn find_by_natural_key(
        &self,
        key: &NaturalKey,
    ) -> Result<Option<StoredEvent>, StoreError> {
        let mut conn = self.pool.get().await?;
        Ok(
            db::calendar_events::find_by_natural_key(&mut conn, &key.calendar_id, &key.event_id)
                .await?,
        )
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<StoredEvent>, StoreError> {
        let mut conn = self.pool.get().await?;
        Ok(db::calendar_events::get_by_id(&mut conn, id).await?)
    }

    async fn insert(&self, event: &ValidEvent) -> Result<StoredEvent, StoreError> {
        let mut conn = self.pool.get().await?;
        Ok(db::calendar_events::insert(&mut conn, NewCalendarEvent::from(event)).await?)
    }

    async fn update(&self, id: Uuid, fields: &EventFields) -> Result<StoredEvent, StoreError> {
        let mut conn = self.pool.get().await?;
        Ok(db::calendar_events::update(&mut conn, id, CalendarEventChanges::from(fields)).await?)
    }

    async fn delete(&self, key: &NaturalKey) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await?;
        let removed =
            db::calendar_events::delete_by_natural_key(&mut conn, &key.calendar_id, &key.event_id)
                .await?;
        Ok(removed > 0)
    }
}

/// In-process repository with the same contract as the database one.
///
/// Writes touching a key registered with `fail_writes_for` are rejected, which
/// lets tests exercise per-record store failures.
#[derive(Default)]
pub struct InMemoryEventRepository {
    events: Mutex<BTreeMap<NaturalKey, StoredEvent>>,
    failing_keys: Mutex<HashSet<NaturalKey>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a repository already holding `events`.
    pub fn with_events(events: impl IntoIterator<Item = ValidEvent>) -> Self {
        let repo = Self::new();
        {
            let mut stored = repo.lock_events();
            for event in events {
                let row = Self::new_row(&event);
                stored.insert(event.key, row);
            }
        }
        repo
    }

    pub fn fail_writes_for(&self, key: NaturalKey) {
        self.failing_keys
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key);
    }

    /// Current contents, ordered by natural key.
    pub fn snapshot(&self) -> Vec<StoredEvent> {
        self.lock_events().values().cloned().collect()
    }

    fn lock_events(&self) -> std::sync::MutexGuard<'_, BTreeMap<NaturalKey, StoredEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_writable(&self, key: &NaturalKey, operation: &str) -> Result<(), StoreError> {
        let failing = self
            .failing_keys
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if failing.contains(key) {
            return Err(StoreError::Rejected(format!(
                "{} of {} rejected by store",
                operation, key
            )));
        }
        Ok(())
    }

    fn new_row(event: &ValidEvent) -> StoredEvent {
        let now = Utc::now();
        StoredEvent {
            id: Uuid::new_v4(),
            calendar_id: event.key.calendar_id.clone(),
            event_id: event.key.event_id.clone(),
            summary: event.fields.summary.clone(),
            description: event.fields.description.clone(),
            start_time: event.fields.start_time,
            end_time: event.fields.end_time,
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn list_all(&self) -> Result<Vec<StoredEvent>, StoreError> {
        let mut events = self.snapshot();
        events.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| a.natural_key().cmp(&b.natural_key()))
        });
        Ok(events)
    }

    async fn find_by_natural_key(
        &self,
        key: &NaturalKey,
    ) -> Result<Option<StoredEvent>, StoreError> {
        Ok(self.lock_events().get(key).cloned())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<StoredEvent>, StoreError> {
        Ok(self.lock_events().values().find(|e| e.id == id).cloned())
    }

    async fn insert(&self, event: &ValidEvent) -> Result<StoredEvent, StoreError> {
        self.check_writable(&event.key, "insert")?;
        let mut events = self.lock_events();
        if events.contains_key(&event.key) {
            return Err(StoreError::Rejected(format!(
                "duplicate natural key {}",
                event.key
            )));
        }
        let row = Self::new_row(event);
        events.insert(event.key.clone(), row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, fields: &EventFields) -> Result<StoredEvent, StoreError> {
        let mut events = self.lock_events();
        let row = events
            .values_mut()
            .find(|e| e.id == id)
            .ok_or(StoreError::Query(diesel::result::Error::NotFound))?;
        self.check_writable(&row.natural_key(), "update")?;

        row.summary = fields.summary.clone();
        row.description = fields.description.clone();
        row.start_time = fields.start_time;
        row.end_time = fields.end_time;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete(&self, key: &NaturalKey) -> Result<bool, StoreError> {
        self.check_writable(key, "delete")?;
        Ok(self.lock_events().remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn event(calendar_id: &str, event_id: &str, summary: &str) -> ValidEvent {
        let start = Utc.with_ymd_and_hms(2023, 9, 15, 10, 0, 0).unwrap();
        ValidEvent {
            key: NaturalKey::new(calendar_id, event_id),
            fields: EventFields {
                summary: summary.to_string(),
                description: "Description".to_string(),
                start_time: start,
                end_time: start + Duration::hours(2),
            },
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_natural_key() {
        let repo = InMemoryEventRepository::new();
        repo.insert(&event("cal_1", "event_1", "First")).await.unwrap();

        let result = repo.insert(&event("cal_1", "event_1", "Second")).await;
        assert!(matches!(result, Err(StoreError::Rejected(_))));
        assert_eq!(repo.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_same_event_id_in_different_calendars() {
        let repo = InMemoryEventRepository::new();
        repo.insert(&event("cal_1", "event_1", "First")).await.unwrap();
        repo.insert(&event("cal_2", "event_1", "Second")).await.unwrap();

        assert_eq!(repo.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_keeps_identity() {
        let repo = InMemoryEventRepository::with_events([event("cal_1", "event_1", "Old")]);
        let stored = repo
            .find_by_natural_key(&NaturalKey::new("cal_1", "event_1"))
            .await
            .unwrap()
            .unwrap();

        let updated = repo
            .update(stored.id, &event("cal_1", "event_1", "New").fields)
            .await
            .unwrap();

        assert_eq!(updated.id, stored.id);
        assert_eq!(updated.summary, "New");
        assert_eq!(updated.created_at, stored.created_at);
        assert_eq!(repo.get_by_id(stored.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_an_error() {
        let repo = InMemoryEventRepository::new();
        let removed = repo
            .delete(&NaturalKey::new("cal_9", "event_9"))
            .await
            .unwrap();
        assert!(!removed);
    }

    #[tokio::test]
    async fn test_failing_key_rejects_writes_only() {
        let repo = InMemoryEventRepository::with_events([event("cal_1", "event_1", "Old")]);
        let key = NaturalKey::new("cal_1", "event_1");
        repo.fail_writes_for(key.clone());

        assert!(repo.find_by_natural_key(&key).await.unwrap().is_some());
        assert!(repo.delete(&key).await.is_err());
        assert_eq!(repo.snapshot().len(), 1);
    }
}
