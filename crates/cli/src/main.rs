//! CLI binary wiring the herald watcher to a library server and a Telegram
//! chat.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use herald_core::{MediaFetcher, Watcher, WatcherOptions};
use herald_messenger_telegram::TelegramMessenger;
use herald_session::{GraphqlAuthenticator, Session};
use herald_source_ws::WsUpdateSource;
use herald_store_fs::FsStore;
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

/// CLI-specific error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Endpoint URL error
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    /// Media fetcher construction error
    #[error("media fetcher error: {0}")]
    Media(String),

    /// Messenger library error
    #[error(transparent)]
    Messenger(#[from] herald_messenger_telegram::Error),

    /// Session library error
    #[error(transparent)]
    Session(#[from] herald_session::Error),
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Delay between reconnection attempts, in seconds
    #[arg(long, default_value_t = 5, env = "HERALD_BACKOFF_SECS")]
    backoff_secs: u64,

    /// Library server HTTP endpoint
    #[arg(
        long,
        default_value = "http://localhost:4567",
        env = "HERALD_HTTP_ENDPOINT"
    )]
    http_endpoint: Url,

    /// Log level
    #[arg(long, default_value = "info", env = "HERALD_LOG_LEVEL")]
    log_level: tracing::Level,

    /// Library server account password
    #[arg(long, default_value = "PASSWORD", env = "HERALD_PASSWORD")]
    password: String,

    /// State directory for the dedup ledger
    #[arg(long, default_value = "./state", env = "HERALD_STATE_DIR")]
    state_dir: PathBuf,

    /// Telegram chat to deliver notifications to
    #[arg(long, default_value = "CHAT_ID", env = "HERALD_TELEGRAM_CHAT_ID")]
    telegram_chat_id: String,

    /// Telegram bot token
    #[arg(long, default_value = "BOT_TOKEN", env = "HERALD_TELEGRAM_TOKEN")]
    telegram_token: String,

    /// Library server account username
    #[arg(long, default_value = "USERNAME", env = "HERALD_USERNAME")]
    username: String,

    /// Library server GraphQL subscription endpoint
    #[arg(
        long,
        default_value = "ws://localhost:4567/api/graphql",
        env = "HERALD_WS_ENDPOINT"
    )]
    ws_endpoint: Url,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    let session = Session::new();

    let authenticator = GraphqlAuthenticator::new(
        args.http_endpoint.join("/api/graphql")?,
        args.username,
        args.password,
        session.clone(),
    )?;

    let media = MediaFetcher::new(args.http_endpoint, session.clone())
        .map_err(|e| Error::Media(e.to_string()))?;

    let watcher = Watcher::new(WatcherOptions {
        authenticator,
        source: WsUpdateSource::new(args.ws_endpoint),
        messenger: TelegramMessenger::new(&args.telegram_token, args.telegram_chat_id)?,
        store: FsStore::new(args.state_dir),
        session,
        media,
        backoff: Duration::from_secs(args.backoff_secs),
    });

    // Create shared shutdown token
    let shutdown_token = CancellationToken::new();

    // Set up signal handlers
    let signal_shutdown_token = shutdown_token.clone();
    tokio::spawn(async move {
        if cfg!(unix) {
            use tokio::signal::unix::{SignalKind, signal};

            let mut sigterm = signal(SignalKind::terminate()).expect("SIGTERM handler failed");
            let mut sigint = signal(SignalKind::interrupt()).expect("SIGINT handler failed");

            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM"),
                _ = sigint.recv() => info!("Received SIGINT"),
            }
        } else {
            // Fall back to just ctrl-c on non-unix platforms
            let _ = tokio::signal::ctrl_c().await;
            info!("Received interrupt signal");
        }

        info!("Shutting down");
        signal_shutdown_token.cancel();
    });

    watcher.run(shutdown_token).await;

    Ok(())
}
