use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use calmirror::auth::{AuthConfig, GoogleOAuthClient};
use calmirror::config::AppConfig;
use calmirror::pollers::{self, CalendarPollerConfig};
use calmirror::provider::{GoogleConnector, GoogleEndpoints};
use calmirror::repository::PgEventRepository;
use calmirror::{db, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "calmirror=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let auth_config = AuthConfig::from_env().map_err(anyhow::Error::msg)?;
    let endpoints = GoogleEndpoints::from_env();

    let pool = db::establish_connection_pool(&config.database_url)?;
    let connector =
        GoogleConnector::new(endpoints.clone()).context("Failed to build Google HTTP client")?;
    let oauth = GoogleOAuthClient::new(&auth_config, endpoints);

    let state = AppState::new(
        Arc::new(PgEventRepository::new(pool)),
        Arc::new(connector),
        auth_config,
        oauth,
    );

    match CalendarPollerConfig::from_app_config(&config) {
        Some(poller_config) => {
            let poll_state = state.clone();
            tokio::spawn(async move {
                pollers::start_calendar_polling_task(poll_state, poller_config).await;
            });
        }
        None => tracing::info!("GOOGLE_REFRESH_TOKEN not set, background sync disabled"),
    }

    let app = routes::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
