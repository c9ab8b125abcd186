//! # Archive Cache daemon (`arcd`)
//!
//! Polls the configured archive directories and maintains the local document
//! mirror the HTTP layer serves.
//!
//! ## Usage
//!
//! ```bash
//! arcd --config ./config/arcd.toml run
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `arcd run` | Poll the configured locations until interrupted |
//! | `arcd fetch-once` | Run a single fetch cycle and exit |

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use archive_cache::config;
use archive_cache::fetcher::{ArchiveFetcher, EventListener, RefreshLocation};
use archive_cache::poller::Poller;
use archive_cache::source::FsArchiveSource;
use archive_cache::store;

/// Archive cache daemon — keeps a local mirror of completed-job archives.
#[derive(Parser)]
#[command(
    name = "arcd",
    about = "Archive cache daemon — keeps a local mirror of completed-job archives",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/arcd.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the configured archive locations until interrupted.
    Run,
    /// Run a single fetch cycle and exit.
    FetchOnce,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load_config(&cli.config)?;

    let store = store::open_store(&config).await?;
    let locations: Vec<RefreshLocation> = config
        .archive
        .locations
        .iter()
        .map(|path| Arc::new(FsArchiveSource::new(path)) as RefreshLocation)
        .collect();

    let listener: EventListener = Box::new(|event| {
        debug!(job_id = %event.job_id, kind = ?event.kind, "archive event");
    });

    let mut fetcher = ArchiveFetcher::new(locations, &config.retention, store, listener)?;

    match cli.command {
        Commands::Run => {
            let interval = Duration::from_secs(config.archive.refresh_interval_secs);
            Poller::new(fetcher, interval).run().await;
        }
        Commands::FetchOnce => {
            fetcher.prime().await;
            fetcher.fetch_archives().await;
        }
    }

    Ok(())
}
