use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared_types::{LoginInitResponse, StoredEvent, SyncResponse, SyncStatus};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "calmirror-cli")]
#[command(about = "CLI for the calmirror calendar sync server")]
#[command(
    long_about = "A command-line interface for the calmirror server.\n\n\
    Triggers calendar syncs and lists the events mirrored from Google Calendar.\n\
    Protected commands need a session token, obtained by logging in through the browser."
)]
struct Cli {
    /// Server URL to connect to.
    #[arg(
        short,
        long,
        default_value = "http://localhost:3000",
        env = "CALMIRROR_API_URL"
    )]
    base_url: String,

    /// Session token, sent as a bearer token.
    ///
    /// This is the value of the `calmirror_session` cookie set after login.
    #[arg(short, long, env = "CALMIRROR_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mirror the current Google Calendar events into the server's database
    Sync,
    /// Inspect mirrored events
    Events {
        #[command(subcommand)]
        action: EventAction,
    },
    /// Print the URL to open in a browser to log in with Google
    Login,
}

#[derive(Subcommand)]
enum EventAction {
    /// List stored events ordered by start time
    List,
    /// Show one stored event in full
    Show {
        /// The UUID of the event, as shown by 'events list'.
        id: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let api = Api {
        client: Client::new(),
        base_url: cli.base_url.trim_end_matches('/').to_string(),
        token: cli.token,
    };

    match cli.command {
        Commands::Sync => handle_sync(&api).await?,
        Commands::Events { action } => handle_events(&api, action).await?,
        Commands::Login => {
            let login: LoginInitResponse =
                read_json(api.get("/auth/login").send().await?).await?;
            println!("Open this URL in your browser to log in:");
            println!("{}", login.auth_url);
        }
    }

    Ok(())
}

struct Api {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl Api {
    fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.get(format!("{}{}", self.base_url, path)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.post(format!("{}{}", self.base_url, path)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> anyhow::Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("Server returned {}: {}", status, body);
    }
    response.json().await.context("Invalid response from server")
}

async fn handle_sync(api: &Api) -> anyhow::Result<()> {
    let response = api.post("/api/sync").send().await?;

    // Failed syncs still carry a SyncResponse body.
    let sync: SyncResponse = match response.status() {
        StatusCode::OK | StatusCode::BAD_GATEWAY | StatusCode::INTERNAL_SERVER_ERROR => response
            .json()
            .await
            .context("Invalid sync response from server")?,
        _ => read_json(response).await?,
    };

    println!("{}", sync.message);
    if let Some(report) = &sync.report {
        println!("    Fetched: {}", report.fetched);
        println!("    {}", report.summary());
        for failure in &report.failures {
            println!(
                "    ! {} {}: {}",
                failure.operation.as_str(),
                failure.key,
                failure.message
            );
        }
    }

    if sync.status == SyncStatus::Failed {
        bail!("Sync failed");
    }
    Ok(())
}

async fn handle_events(api: &Api, action: EventAction) -> anyhow::Result<()> {
    match action {
        EventAction::List => {
            let events: Vec<StoredEvent> = read_json(api.get("/api/events").send().await?).await?;
            if events.is_empty() {
                println!("No events found.");
            } else {
                for event in events {
                    println!(
                        "[{}] {} {}",
                        &event.id.to_string()[..8],
                        event.start_time.format("%Y-%m-%d %H:%M"),
                        event.summary
                    );
                }
            }
        }
        EventAction::Show { id } => {
            let event: StoredEvent =
                read_json(api.get(&format!("/api/events/{}", id)).send().await?).await?;
            println!("{}", event.summary);
            println!("    ID:       {}", event.id);
            println!("    Calendar: {}", event.calendar_id);
            println!("    Event:    {}", event.event_id);
            println!("    Start:    {}", event.start_time.to_rfc3339());
            println!("    End:      {}", event.end_time.to_rfc3339());
            if !event.description.is_empty() {
                println!("    {}", event.description);
            }
        }
    }

    Ok(())
}
