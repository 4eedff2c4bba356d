use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use tubesync::cli::input;
use tubesync::config::SyncConfig;
use tubesync::providers::notion::NotionProvider;
use tubesync::providers::youtube::YoutubeProvider;
use tubesync::sync::orchestrator::SyncEngine;
use tubesync::util::env;

#[derive(Parser, Debug)]
#[command(name = "tubesync", version, about = "YouTube to Notion video sync")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Fetch catalog metadata for the given videos and reconcile the store databases
    Sync {
        /// Comma-separated video ids
        #[arg(long)]
        ids: Option<String>,
        /// CSV file with a "Video Id" column
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Ids per catalog request (1-50, defaults to 50)
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Validate configuration and log a redacted snapshot
    ConfigCheck,
}

#[tokio::main]
async fn main() -> Result<()> {
    tubesync::tracing::init_tracing("info")?;
    env::init_env();

    let cli = Cli::parse();
    match cli.command {
        Commands::Sync {
            ids,
            csv,
            batch_size,
        } => run_sync(ids, csv, batch_size).await,
        Commands::ConfigCheck => config_check(),
    }
}

fn config_check() -> Result<()> {
    env::preflight_check(
        "tubesync",
        &[
            "YOUTUBE_API_KEY",
            "NOTION_API_KEY",
            "NOTION_VIDEO_DATABASE_ID",
            "NOTION_CHANNEL_DATABASE_ID",
        ],
        &["SYNC_BATCH_SIZE", "SYNC_HTTP_TIMEOUT_SECS"],
    )?;
    SyncConfig::from_env()?;
    info!(target: "tubesync", "configuration ok");
    Ok(())
}

async fn run_sync(
    ids: Option<String>,
    csv: Option<PathBuf>,
    batch_size: Option<usize>,
) -> Result<()> {
    let mut video_ids = Vec::new();
    if let Some(raw) = ids.as_deref() {
        video_ids.extend(input::parse_inline_ids(raw));
    }
    if let Some(path) = csv.as_deref() {
        video_ids.extend(input::read_csv_ids(path)?);
    }
    if video_ids.is_empty() {
        bail!("no video ids supplied; pass --ids and/or --csv");
    }

    let mut config = SyncConfig::from_env()?;
    if let Some(size) = batch_size {
        config.batch_size = size;
        config.validate()?;
    }

    let catalog = YoutubeProvider::new(&config.youtube_api_key, config.http_timeout_secs)?;
    let store = NotionProvider::new(&config.notion_api_key, config.http_timeout_secs)?;
    let engine = SyncEngine::new(catalog, store, config);

    let summary = engine.run(&video_ids).await?;
    info!(
        target: "tubesync",
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "sync finished"
    );
    if summary.failed > 0 {
        // Per-item failures were already logged; surface them in the exit code.
        std::process::exit(1);
    }
    Ok(())
}
