//! Shared application state handed to every handler and background task.

use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::auth::{AuthConfig, GoogleOAuthClient};
use crate::provider::ProviderConnector;
use crate::repository::EventRepository;

#[derive(Clone)]
pub struct AppState {
    pub events: Arc<dyn EventRepository>,
    pub connector: Arc<dyn ProviderConnector>,
    pub auth_config: AuthConfig,
    pub oauth: GoogleOAuthClient,
    sync_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        events: Arc<dyn EventRepository>,
        connector: Arc<dyn ProviderConnector>,
        auth_config: AuthConfig,
        oauth: GoogleOAuthClient,
    ) -> Self {
        Self {
            events,
            connector,
            auth_config,
            oauth,
            sync_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Held for the whole of a sync attempt. The reconciler itself does not
    /// exclude concurrent runs against the same store.
    pub async fn lock_sync(&self) -> MutexGuard<'_, ()> {
        self.sync_lock.lock().await
    }
}
