//! Google Calendar REST client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shared_types::EventRecord;
use std::sync::Arc;
use std::time::Duration;

use super::{AccessToken, CalendarProvider, ProviderConnector};
use crate::error::ProviderError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Google endpoints. Overridable so tests can point at a mock server.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub api_base: String,
    pub tokeninfo_url: String,
    pub token_url: String,
    pub auth_url: String,
    pub userinfo_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/calendar/v3".to_string(),
            tokeninfo_url: "https://www.googleapis.com/oauth2/v3/tokeninfo".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
        }
    }
}

impl GoogleEndpoints {
    /// Defaults, with any of `GOOGLE_API_BASE`, `GOOGLE_TOKENINFO_URL`,
    /// `GOOGLE_TOKEN_URL`, `GOOGLE_AUTH_URL` and `GOOGLE_USERINFO_URL` applied on top.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base: std::env::var("GOOGLE_API_BASE").unwrap_or(defaults.api_base),
            tokeninfo_url: std::env::var("GOOGLE_TOKENINFO_URL")
                .unwrap_or(defaults.tokeninfo_url),
            token_url: std::env::var("GOOGLE_TOKEN_URL").unwrap_or(defaults.token_url),
            auth_url: std::env::var("GOOGLE_AUTH_URL").unwrap_or(defaults.auth_url),
            userinfo_url: std::env::var("GOOGLE_USERINFO_URL").unwrap_or(defaults.userinfo_url),
        }
    }
}

/// Builds a `GoogleCalendarClient` per credential, sharing one HTTP client.
#[derive(Clone)]
pub struct GoogleConnector {
    http: reqwest::Client,
    endpoints: GoogleEndpoints,
}

impl GoogleConnector {
    pub fn new(endpoints: GoogleEndpoints) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, endpoints })
    }

    pub fn client(&self, credential: AccessToken) -> GoogleCalendarClient {
        GoogleCalendarClient {
            http: self.http.clone(),
            endpoints: self.endpoints.clone(),
            token: credential,
        }
    }
}

impl ProviderConnector for GoogleConnector {
    fn connect(&self, credential: AccessToken) -> Arc<dyn CalendarProvider> {
        Arc::new(self.client(credential))
    }
}

/// Client for the Google Calendar API, bound to one access token
pub struct GoogleCalendarClient {
    http: reqwest::Client,
    endpoints: GoogleEndpoints,
    token: AccessToken,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct CalendarListEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GoogleEvent {
    id: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    start: Option<GoogleEventTime>,
    end: Option<GoogleEventTime>,
}

/// All-day events only carry `date`, which is not a timestamp and is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEventTime {
    date_time: Option<String>,
}

impl GoogleEvent {
    fn into_record(self, calendar_id: &str) -> EventRecord {
        EventRecord {
            calendar_id: Some(calendar_id.to_string()),
            event_id: self.id,
            summary: self.summary,
            description: self.description,
            start_time: parse_date_time(self.start),
            end_time: parse_date_time(self.end),
        }
    }
}

fn parse_date_time(time: Option<GoogleEventTime>) -> Option<DateTime<Utc>> {
    let raw = time?.date_time?;
    match DateTime::parse_from_rfc3339(&raw) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(e) => {
            tracing::debug!("ignoring unparseable dateTime '{}': {}", raw, e);
            None
        }
    }
}

impl GoogleCalendarClient {
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProviderError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(self.token.secret())
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ProviderError::Unauthorized(status.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))
    }

    /// IDs of every calendar in the user's calendar list
    pub async fn list_calendars(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/users/me/calendarList", self.endpoints.api_base);
        let list: ListResponse<CalendarListEntry> = self.get_json(&url).await?;
        Ok(list.items.into_iter().map(|c| c.id).collect())
    }

    pub async fn list_events(&self, calendar_id: &str) -> Result<Vec<EventRecord>, ProviderError> {
        let url = format!(
            "{}/calendars/{}/events",
            self.endpoints.api_base,
            urlencoding::encode(calendar_id)
        );
        let list: ListResponse<GoogleEvent> = self.get_json(&url).await?;
        Ok(list
            .items
            .into_iter()
            .map(|event| event.into_record(calendar_id))
            .collect())
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarClient {
    async fn validate_credential(&self) -> bool {
        let response = match self
            .http
            .get(&self.endpoints.tokeninfo_url)
            .query(&[("access_token", self.token.secret())])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Token validation request failed: {}", e);
                return false;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Token rejected by tokeninfo: {}", response.status());
            return false;
        }

        match response.json::<serde_json::Value>().await {
            Ok(info) => info.get("error").is_none(),
            Err(e) => {
                tracing::warn!("Invalid tokeninfo response: {}", e);
                false
            }
        }
    }

    async fn fetch_events(&self) -> Result<Vec<EventRecord>, ProviderError> {
        let calendars = self.list_calendars().await?;
        tracing::debug!("Fetching events from {} calendars", calendars.len());

        let mut events = Vec::new();
        for calendar_id in &calendars {
            let calendar_events = self.list_events(calendar_id).await?;
            tracing::debug!(
                calendar_id = %calendar_id,
                count = calendar_events.len(),
                "fetched calendar events"
            );
            events.extend(calendar_events);
        }

        Ok(events)
    }
}
