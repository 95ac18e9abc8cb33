use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

const DEFAULT_SYNC_INTERVAL_SECS: u64 = 900;

/// Server settings read from the environment. Auth settings live in
/// `auth::AuthConfig`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    /// Enables the background sync when set.
    pub google_refresh_token: Option<String>,
    pub sync_interval: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let sync_interval_secs = match env::var("CALENDAR_SYNC_INTERVAL_SECS") {
            Ok(value) => value
                .parse()
                .context("CALENDAR_SYNC_INTERVAL_SECS must be a number of seconds")?,
            Err(_) => DEFAULT_SYNC_INTERVAL_SECS,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            google_refresh_token: env::var("GOOGLE_REFRESH_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty()),
            sync_interval: Duration::from_secs(sync_interval_secs.max(1)),
        })
    }
}
