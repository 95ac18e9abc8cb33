use diesel_async::{
    pooled_connection::{deadpool::Pool, AsyncDieselConnectionManager, ManagerConfig},
    AsyncPgConnection,
};

pub type DbPool = Pool<AsyncPgConnection>;

async fn establish_tls_connection(config: String) -> diesel::ConnectionResult<AsyncPgConnection> {
    // Set up rustls TLS configuration
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

    let (client, connection) = tokio_postgres::connect(&config, tls)
        .await
        .map_err(|e| diesel::ConnectionError::BadConnection(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Connection error: {}", e);
        }
    });

    AsyncPgConnection::try_from(client).await
}

pub fn establish_connection_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let mut manager_config = ManagerConfig::default();
    manager_config.custom_setup =
        Box::new(|url| Box::pin(establish_tls_connection(url.to_string())));

    let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(
        database_url,
        manager_config,
    );
    let pool = Pool::builder(config).max_size(10).build()?;

    Ok(pool)
}

// Calendar event database operations
pub mod calendar_events {
    use diesel::prelude::*;
    use diesel_async::{AsyncPgConnection, RunQueryDsl};
    use shared_types::StoredEvent;
    use uuid::Uuid;

    use crate::models::{CalendarEventChanges, NewCalendarEvent};

    pub async fn list_all(conn: &mut AsyncPgConnection) -> QueryResult<Vec<StoredEvent>> {
        use crate::schema::calendar_events::dsl::*;

        calendar_events
            .order_by((start_time.asc(), calendar_id.asc(), event_id.asc()))
            .load::<StoredEvent>(conn)
            .await
    }

    pub async fn get_by_id(
        conn: &mut AsyncPgConnection,
        event_uuid: Uuid,
    ) -> QueryResult<Option<StoredEvent>> {
        use crate::schema::calendar_events::dsl::*;

        calendar_events
            .filter(id.eq(event_uuid))
            .first::<StoredEvent>(conn)
            .await
            .optional()
    }

    pub async fn find_by_natural_key(
        conn: &mut AsyncPgConnection,
        calendar: &str,
        event: &str,
    ) -> QueryResult<Option<StoredEvent>> {
        use crate::schema::calendar_events::dsl::*;

        calendar_events
            .filter(calendar_id.eq(calendar))
            .filter(event_id.eq(event))
            .first::<StoredEvent>(conn)
            .await
            .optional()
    }

    pub async fn insert(
        conn: &mut AsyncPgConnection,
        new_event: NewCalendarEvent,
    ) -> QueryResult<StoredEvent> {
        use crate::schema::calendar_events::dsl::*;

        diesel::insert_into(calendar_events)
            .values(&new_event)
            .get_result::<StoredEvent>(conn)
            .await
    }

    pub async fn update(
        conn: &mut AsyncPgConnection,
        event_uuid: Uuid,
        changes: CalendarEventChanges,
    ) -> QueryResult<StoredEvent> {
        use crate::schema::calendar_events::dsl::*;

        diesel::update(calendar_events.filter(id.eq(event_uuid)))
            .set(&changes)
            .get_result::<StoredEvent>(conn)
            .await
    }

    /// Returns the number of rows removed (0 if the event was already gone).
    pub async fn delete_by_natural_key(
        conn: &mut AsyncPgConnection,
        calendar: &str,
        event: &str,
    ) -> QueryResult<usize> {
        use crate::schema::calendar_events::dsl::*;

        diesel::delete(
            calendar_events
                .filter(calendar_id.eq(calendar))
                .filter(event_id.eq(event)),
        )
        .execute(conn)
        .await
    }
}
