mod auth;
mod config;

use clap::{Parser, Subcommand};
use config::{FieldreportConfig, SessionBackend, StorageBackend};
use fieldreport_channels::{BotApi, ChannelEvent, TelegramChannel, TelegramNotifier};
use fieldreport_core::{AccessTokenSource, InputKind, StepSchedule};
use fieldreport_engine::StepEngine;
use fieldreport_gateway::{EventRouter, GatewayServer};
use fieldreport_media::{
    DriveStorage, DurableStorage, GcsStorage, MediaRelay, StorageRelay, TelegramFileSource,
};
use fieldreport_session::{FileSessionStore, InMemorySessionStore, SessionStore};
use fieldreport_sinks::{GoogleSheetsBackend, ReportSink, ReportSinkAdapter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fieldreport", about = "Fieldreport: site-visit reports over Telegram")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "fieldreport.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the Telegram webhook
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Receive updates by long polling instead of a webhook
    Poll,
    /// Print the report schedule
    Schedule,
}

/// Capacity of the polled-update buffer.
const EVENT_BUFFER: usize = 256;

/// Everything wired together.
struct Runtime {
    router: Arc<EventRouter>,
    channel: Arc<TelegramChannel>,
}

async fn session_store(config: &FieldreportConfig) -> anyhow::Result<Arc<dyn SessionStore>> {
    Ok(match config.sessions.backend {
        SessionBackend::Memory => Arc::new(InMemorySessionStore::new()),
        SessionBackend::File => {
            let dir = config.data_dir.join("sessions");
            let store = FileSessionStore::new(dir.clone()).await?;
            let restored = store.list().await?.len();
            info!(dir = %dir.display(), restored, "Persisting sessions to disk");
            Arc::new(store)
        }
    })
}

fn media_relay(
    config: &FieldreportConfig,
    tokens: Arc<dyn AccessTokenSource>,
    client: &reqwest::Client,
) -> Arc<dyn MediaRelay> {
    let source = TelegramFileSource::new(config.telegram.bot_token.as_str(), client.clone())
        .with_api_base(config.telegram.api_base.as_str());

    let storage: Arc<dyn DurableStorage> = match config.storage.backend {
        StorageBackend::Gcs => Arc::new(GcsStorage::new(
            config.storage.bucket.as_str(),
            tokens,
            client.clone(),
        )),
        StorageBackend::Drive => Arc::new(DriveStorage::new(
            config.storage.folder_id.as_str(),
            tokens,
            client.clone(),
        )),
    };

    Arc::new(
        StorageRelay::new(Arc::new(source), storage)
            .with_max_bytes(config.media.max_bytes)
            .with_default_extension(config.media.default_extension.as_str()),
    )
}

fn report_sink(
    config: &FieldreportConfig,
    schedule: Arc<StepSchedule>,
    api: BotApi,
    tokens: Arc<dyn AccessTokenSource>,
    client: &reqwest::Client,
) -> Arc<dyn ReportSink> {
    let sheets = GoogleSheetsBackend::new(
        config.sheets.spreadsheet_id.as_str(),
        config.sheets.range.as_str(),
        tokens,
        client.clone(),
    );
    let notifier = TelegramNotifier::new(api, config.notification.chat_id.as_str())
        .with_thread(config.notification.thread_id);

    Arc::new(
        ReportSinkAdapter::new(schedule, Arc::new(sheets), Arc::new(notifier))
            .with_media_source(config.notification.media_source),
    )
}

async fn build_runtime(
    config: &FieldreportConfig,
) -> anyhow::Result<(Runtime, mpsc::Receiver<ChannelEvent>)> {
    config.validate()?;
    let schedule = Arc::new(config.schedule()?);
    let tokens = auth::token_source(&config.google).await?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?;
    let api = BotApi::new(config.telegram.bot_token.as_str(), client.clone())
        .with_api_base(config.telegram.api_base.as_str());

    let mut channel = TelegramChannel::new(api.clone(), EVENT_BUFFER);
    let events = channel
        .take_event_receiver()
        .ok_or_else(|| anyhow::anyhow!("Telegram event receiver already taken"))?;
    let channel = Arc::new(channel);

    let engine = Arc::new(StepEngine::new(
        schedule.clone(),
        session_store(config).await?,
        media_relay(config, tokens.clone(), &client),
        report_sink(config, schedule.clone(), api, tokens, &client),
    ));
    info!(
        steps = schedule.len(),
        storage = ?config.storage.backend,
        sessions = ?config.sessions.backend,
        "Step engine ready"
    );

    let router = Arc::new(EventRouter::new(engine, channel.clone()));
    Ok((Runtime { router, channel }, events))
}

fn print_schedule(schedule: &StepSchedule) {
    println!("Report schedule:");
    for (index, step) in schedule.steps().iter().enumerate() {
        let kind = match step.kind {
            InputKind::SingleChoice => "single choice",
            InputKind::MultiChoice => "multiple choice",
            InputKind::FreeText => "text",
            InputKind::Media => "photo or file",
        };
        let optional = if step.optional { ", optional" } else { "" };
        println!("  {}. {} [{}] ({kind}{optional})", index + 1, step.label, step.key);
        for choice in &step.choices {
            println!("      {}: {}", choice.id, choice.label);
        }
    }
    println!("\nTotal: {} step(s)", schedule.len());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();
    let config = FieldreportConfig::load(&cli.config).await?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let (runtime, _events) = build_runtime(&config).await?;

            match &config.telegram.webhook_url {
                Some(url) => runtime.channel.set_webhook(url).await?,
                None => warn!("No webhook_url configured; updates arrive only if the webhook is already registered"),
            }

            let app = GatewayServer::build(runtime.router);
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("Fieldreport gateway listening on {}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Poll => {
            let (runtime, events) = build_runtime(&config).await?;
            runtime.channel.delete_webhook().await?;

            let event_loop = tokio::spawn(runtime.router.clone().run(events));
            // A rejected poll also disconnects the event loop.
            let polled = runtime.channel.poll_updates().await;
            let _ = event_loop.await;
            polled?;
        }
        Commands::Schedule => print_schedule(&config.schedule()?),
    }

    Ok(())
}
