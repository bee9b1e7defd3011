use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{HttpTodoClient, ListController};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod render;
mod session;

use config::{load_settings, normalize_base_url};

#[derive(Parser, Debug)]
struct Args {
    /// TOML settings file; missing files fall back to defaults.
    #[arg(long, default_value = "todo.toml")]
    config: PathBuf,
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(&args.config)?;
    if let Some(api_url) = args.api_url {
        settings.api_base_url = normalize_base_url(&api_url);
    }
    if let Some(timeout_secs) = args.timeout_secs {
        settings.request_timeout_secs = timeout_secs;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!(api = %settings.api_base_url, "starting todo client");
    let client = HttpTodoClient::with_timeout(
        &settings.api_base_url,
        Duration::from_secs(settings.request_timeout_secs),
    )
    .context("failed to build todo api client")?;

    let controller = ListController::new(Arc::new(client));
    session::run(controller, tokio::io::stdin(), tokio::io::stdout()).await
}
