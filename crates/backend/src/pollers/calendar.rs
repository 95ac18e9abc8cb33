//! Periodic calendar sync.
//!
//! Uses a long-lived Google refresh token to obtain a fresh access token on
//! every tick, then runs the same reconcile as `POST /api/sync`.

use std::time::Duration;

use crate::config::AppConfig;
use crate::provider::AccessToken;
use crate::sync;
use crate::AppState;
use shared_types::SyncOutcome;

/// Configuration for the calendar polling task
#[derive(Debug, Clone)]
pub struct CalendarPollerConfig {
    /// How often to sync (default: 15 minutes)
    pub poll_interval: Duration,
    pub refresh_token: String,
}

impl CalendarPollerConfig {
    /// `None` when no refresh token is configured.
    pub fn from_app_config(config: &AppConfig) -> Option<Self> {
        config
            .google_refresh_token
            .as_ref()
            .map(|refresh_token| Self {
                poll_interval: config.sync_interval,
                refresh_token: refresh_token.clone(),
            })
    }
}

/// Start the calendar polling background task. Runs until the process exits.
pub async fn start_calendar_polling_task(state: AppState, config: CalendarPollerConfig) {
    tracing::info!(
        "Calendar polling task started (interval: {:?})",
        config.poll_interval
    );

    loop {
        run_poll_cycle(&state, &config).await;
        tokio::time::sleep(config.poll_interval).await;
    }
}

/// One background sync. Failures are logged and retried on the next tick.
pub async fn run_poll_cycle(
    state: &AppState,
    config: &CalendarPollerConfig,
) -> Option<SyncOutcome> {
    let tokens = match state.oauth.refresh_access_token(&config.refresh_token).await {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::error!("Could not refresh Google access token: {}", e);
            return None;
        }
    };

    let provider = state.connector.connect(AccessToken::new(tokens.access_token));

    let _guard = state.lock_sync().await;
    let outcome = sync::synchronize(provider.as_ref(), state.events.as_ref()).await;
    let status = outcome.status();
    tracing::debug!(status = status.as_str(), "Background sync finished");
    Some(outcome)
}
