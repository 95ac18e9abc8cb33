//! Remote calendar providers.
//!
//! A provider is built for one credential and one sync attempt through a
//! `ProviderConnector`, so nothing credential-related lives in shared state.

use async_trait::async_trait;
use shared_types::EventRecord;
use std::fmt;
use std::sync::Arc;

use crate::error::ProviderError;

pub mod google;

pub use google::{GoogleCalendarClient, GoogleConnector, GoogleEndpoints};

/// An OAuth access token for the calendar provider.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Whether the credential is currently accepted by the provider.
    async fn validate_credential(&self) -> bool;

    /// Complete snapshot of events across every calendar visible to the credential.
    async fn fetch_events(&self) -> Result<Vec<EventRecord>, ProviderError>;
}

pub trait ProviderConnector: Send + Sync {
    fn connect(&self, credential: AccessToken) -> Arc<dyn CalendarProvider>;
}
