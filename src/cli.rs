use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::client::websocket_client::SessionClient;
use crate::core::terminal;

pub const DEFAULT_URL: &str = "ws://127.0.0.1:8080/ws";

#[derive(Parser, Debug)]
#[command(name = "pokerterm")]
#[command(about = "Terminal client for a WebSocket poker table")]
#[command(version)]
pub struct Cli {
    /// Backend WebSocket endpoint
    #[arg(short, long, env = "POKERTERM_URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// File that receives the client's logs (the terminal is busy drawing the table)
    #[arg(long, env = "POKERTERM_LOG_FILE", default_value = "pokerterm.log")]
    pub log_file: PathBuf,
}

pub async fn run_cli() -> Result<()> {
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(&cli.log_file)?;

    let client = SessionClient::new(cli.url);
    let mut term = ratatui::init();
    let keys = terminal::spawn_key_reader();

    let result = client
        .connect_and_play(keys, |session| terminal::draw(&mut term, session))
        .await;

    ratatui::restore();
    let session = result?;
    info!(state = %session.state(), skipped = session.skipped(), "session ended");
    Ok(())
}

fn init_tracing(log_file: &Path) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("failed to open log file {}", log_file.display()))?;
    let writer = Arc::new(file);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false)
            .compact()
            .init();
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
        previous(info);
    }));

    Ok(())
}
