use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Sentinel meaning "keep every archived job" for `retained_jobs`.
pub const UNBOUNDED_HISTORY: i64 = -1;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ArchiveConfig {
    /// Monitored archive directories. At least one is required.
    pub locations: Vec<PathBuf>,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

fn default_refresh_interval() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetentionConfig {
    /// Keep the newest N jobs per location, or [`UNBOUNDED_HISTORY`].
    #[serde(default = "default_retained_jobs")]
    pub retained_jobs: i64,
    /// Evict entries beyond `retained_jobs` from the local cache.
    #[serde(default = "default_true")]
    pub evict_beyond_limit: bool,
    /// Evict cached jobs whose source archive disappeared.
    #[serde(default)]
    pub cleanup_expired: bool,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            retained_jobs: UNBOUNDED_HISTORY,
            evict_beyond_limit: true,
            cleanup_expired: false,
        }
    }
}

fn default_retained_jobs() -> i64 {
    UNBOUNDED_HISTORY
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Backend selector: `file` or `kvstore`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Local storage root: the web directory for the file backend, the
    /// database directory for the kvstore backend.
    pub root: PathBuf,
}

fn default_backend() -> String {
    "file".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;

    Ok(config)
}

/// Fail-fast validation. Bad retention or backend values must never survive
/// until a cycle runs.
pub fn validate(config: &Config) -> Result<(), Error> {
    if config.archive.locations.is_empty() {
        return Err(Error::Configuration(
            "archive.locations must name at least one directory".to_string(),
        ));
    }

    if config.archive.refresh_interval_secs == 0 {
        return Err(Error::Configuration(
            "archive.refresh_interval_secs must be > 0".to_string(),
        ));
    }

    let retained = config.retention.retained_jobs;
    if retained == 0 || retained < UNBOUNDED_HISTORY {
        return Err(Error::Configuration(format!(
            "retention.retained_jobs must be at least 1, or {} for unbounded history, got {}",
            UNBOUNDED_HISTORY, retained
        )));
    }

    match config.storage.backend.as_str() {
        "file" | "kvstore" => {}
        other => {
            return Err(Error::Configuration(format!(
                "Unknown storage backend: '{}'. Must be file or kvstore.",
                other
            )));
        }
    }

    Ok(())
}
