//! Drives the HTTP router end to end against the in-memory repository.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use serde_json::Value;
use shared_types::{EventFields, EventRecord, NaturalKey, StoredEvent, ValidEvent};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use calmirror::auth::{self, AuthConfig, GoogleOAuthClient};
use calmirror::error::ProviderError;
use calmirror::provider::{AccessToken, CalendarProvider, GoogleEndpoints, ProviderConnector};
use calmirror::repository::InMemoryEventRepository;
use calmirror::{routes, AppState};

const VALID_TOKEN: &str = "ya29.valid";

/// Serves one scripted snapshot to every provider it builds. Only
/// `VALID_TOKEN` passes credential validation.
#[derive(Clone, Default)]
struct ScriptedConnector {
    snapshot: Arc<Mutex<Option<Vec<EventRecord>>>>,
    connected_with: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConnector {
    fn returning(records: Vec<EventRecord>) -> Self {
        let connector = Self::default();
        *connector.snapshot.lock().unwrap() = Some(records);
        connector
    }

    fn failing() -> Self {
        Self::default()
    }
}

struct ScriptedProvider {
    token: AccessToken,
    snapshot: Option<Vec<EventRecord>>,
}

#[async_trait]
impl CalendarProvider for ScriptedProvider {
    async fn validate_credential(&self) -> bool {
        self.token.secret() == VALID_TOKEN
    }

    async fn fetch_events(&self) -> Result<Vec<EventRecord>, ProviderError> {
        self.snapshot
            .clone()
            .ok_or_else(|| ProviderError::Unavailable("Some error".to_string()))
    }
}

impl ProviderConnector for ScriptedConnector {
    fn connect(&self, credential: AccessToken) -> Arc<dyn CalendarProvider> {
        self.connected_with
            .lock()
            .unwrap()
            .push(credential.secret().to_string());
        Arc::new(ScriptedProvider {
            token: credential,
            snapshot: self.snapshot.lock().unwrap().clone(),
        })
    }
}

fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "integration-test-secret".to_string(),
        allowed_emails: Vec::new(),
        default_session_secs: 3600,
        cookie_name: "calmirror_session".to_string(),
        google_client_id: "client-id".to_string(),
        google_client_secret: "client-secret".to_string(),
        auth_redirect_uri: "http://localhost:3000/auth/callback".to_string(),
    }
}

fn app_with(store: Arc<InMemoryEventRepository>, connector: ScriptedConnector) -> Router {
    let config = auth_config();
    let oauth = GoogleOAuthClient::new(&config, GoogleEndpoints::default());
    routes::app(AppState::new(store, Arc::new(connector), config, oauth))
}

fn session_for(google_token: &str) -> String {
    auth::create_token(
        &auth_config(),
        "user@example.com",
        Some("User".to_string()),
        &AccessToken::new(google_token),
        Duration::hours(1),
    )
    .unwrap()
}

fn sync_request(session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/api/sync");
    if let Some(session) = session {
        builder = builder.header(
            header::COOKIE,
            format!("calmirror_session={}", session),
        );
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn record(calendar_id: &str, event_id: &str, summary: &str) -> EventRecord {
    let start = Utc.with_ymd_and_hms(2023, 9, 15, 10, 0, 0).unwrap();
    EventRecord {
        calendar_id: Some(calendar_id.to_string()),
        event_id: Some(event_id.to_string()),
        summary: Some(summary.to_string()),
        description: Some("Description".to_string()),
        start_time: Some(start),
        end_time: Some(start + Duration::hours(2)),
    }
}

fn stored(calendar_id: &str, event_id: &str, summary: &str) -> ValidEvent {
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
async fn sync_without_session_is_rejected() {
    let store = Arc::new(InMemoryEventRepository::new());
    let connector = ScriptedConnector::returning(vec![record("cal_1", "event_1", "A")]);
    let app = app_with(store.clone(), connector.clone());

    let response = app.oneshot(sync_request(None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await["error"],
        "You need to authenticate first."
    );
    assert!(connector.connected_with.lock().unwrap().is_empty());
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn sync_with_revoked_google_token_is_rejected() {
    let store = Arc::new(InMemoryEventRepository::new());
    let connector = ScriptedConnector::returning(vec![record("cal_1", "event_1", "A")]);
    let app = app_with(store.clone(), connector);

    let session = session_for("ya29.revoked");
    let response = app.oneshot(sync_request(Some(&session))).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await["error"],
        "You need to authenticate first."
    );
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn sync_creates_events_with_session_credential() {
    let store = Arc::new(InMemoryEventRepository::new());
    let connector = ScriptedConnector::returning(vec![
        record("cal_1", "event_1", "Test Event 1"),
        record("cal_2", "event_2", "Test Event 2"),
    ]);
    let app = app_with(store.clone(), connector.clone());

    let session = session_for(VALID_TOKEN);
    let response = app.oneshot(sync_request(Some(&session))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "synchronized");
    assert_eq!(body["message"], "Events synchronized successfully.");
    assert_eq!(body["report"]["created"], 2);

    assert_eq!(
        *connector.connected_with.lock().unwrap(),
        vec![VALID_TOKEN.to_string()]
    );
    assert_eq!(store.snapshot().len(), 2);
}

#[tokio::test]
async fn sync_with_empty_calendar_reports_no_events() {
    let store = Arc::new(InMemoryEventRepository::with_events([stored(
        "cal_1", "event_1", "Old",
    )]));
    let app = app_with(store.clone(), ScriptedConnector::returning(vec![]));

    let session = session_for(VALID_TOKEN);
    let response = app.oneshot(sync_request(Some(&session))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "no_events");
    assert_eq!(body["message"], "No events found to synchronize.");
    assert_eq!(body["report"]["deleted"], 1);
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn provider_failure_returns_bad_gateway_and_keeps_store() {
    let store = Arc::new(InMemoryEventRepository::with_events([stored(
        "cal_1", "event_1", "Kept",
    )]));
    let before = store.snapshot();
    let app = app_with(store.clone(), ScriptedConnector::failing());

    let session = session_for(VALID_TOKEN);
    let response = app.oneshot(sync_request(Some(&session))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["status"], "failed");
    assert_eq!(
        body["message"],
        "An error occurred while syncing events: Some error"
    );
    assert!(body.get("report").is_none());
    assert_eq!(store.snapshot(), before);
}

#[tokio::test]
async fn list_and_show_events() {
    let store = Arc::new(InMemoryEventRepository::with_events([
        stored("cal_1", "event_1", "First"),
        stored("cal_2", "event_2", "Second"),
    ]));
    let app = app_with(store.clone(), ScriptedConnector::returning(vec![]));
    let session = session_for(VALID_TOKEN);

    let list = Request::builder()
        .uri("/api/events")
        .header(header::AUTHORIZATION, format!("Bearer {}", session))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(list).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let events: Vec<StoredEvent> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].calendar_id, "cal_1");

    let show = Request::builder()
        .uri(format!("/api/events/{}", events[1].id))
        .header(header::AUTHORIZATION, format!("Bearer {}", session))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(show).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["summary"], "Second");

    let missing = Request::builder()
        .uri(format!("/api/events/{}", uuid::Uuid::new_v4()))
        .header(header::AUTHORIZATION, format!("Bearer {}", session))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(missing).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_is_public() {
    let app = app_with(
        Arc::new(InMemoryEventRepository::new()),
        ScriptedConnector::failing(),
    );
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
