//! Storage abstraction for extracted archive documents.
//!
//! The [`HistoryStore`] trait defines every operation the fetch cycle and
//! the overview aggregator need, enabling pluggable backends (one file per
//! document, or an embedded key-value store). The HTTP layer reads the same
//! backend; implementations must make writes visible to concurrent readers
//! the moment they are acknowledged, and readers must never observe a torn
//! document.
//!
//! Implementations must be `Send + Sync`; the base design has a single
//! writer (the fetch cycle) and any number of readers.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Error;
use crate::store_fs::FileStore;
use crate::store_kv::KvStore;

/// Abstract storage backend for the archive cache.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`put`](HistoryStore::put) | Write one extracted document for a job |
/// | [`delete_job`](HistoryStore::delete_job) | Remove every document for a job |
/// | [`delete_overview`](HistoryStore::delete_overview) | Remove only a job's overview document |
/// | [`list_overviews`](HistoryStore::list_overviews) | Enumerate all stored per-job overviews |
/// | [`exists`](HistoryStore::exists) | Whether a job's documents are present |
/// | [`put_combined_overview`](HistoryStore::put_combined_overview) | Atomically publish the combined listing |
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Write one document at its logical path.
    ///
    /// Idempotent: re-ingesting a job overwrites cleanly, leaving no residue
    /// from a prior partial write at the same path.
    async fn put(&self, job_id: &str, path: &str, json: &str) -> Result<()>;

    /// Remove every document belonging to a job.
    ///
    /// Total from the reader's perspective: after this returns no trace of
    /// the job is visible. Each physical removal is attempted even if an
    /// earlier one fails; the first failure is reported so the caller can log
    /// it as housekeeping.
    async fn delete_job(&self, job_id: &str) -> Result<()>;

    /// Remove only the per-job overview document.
    async fn delete_overview(&self, job_id: &str) -> Result<()>;

    /// All stored per-job overview documents, as `(job_id, json)` pairs.
    async fn list_overviews(&self) -> Result<Vec<(String, String)>>;

    /// Whether the job's overview document is present.
    async fn exists(&self, job_id: &str) -> Result<bool>;

    /// Publish the combined overview listing in a single atomic step.
    ///
    /// Readers see either the previous document or the new one, never a
    /// partially written state.
    async fn put_combined_overview(&self, json: &str) -> Result<()>;
}

/// Configuration-driven backend factory.
pub async fn open_store(config: &Config) -> Result<Arc<dyn HistoryStore>> {
    match config.storage.backend.as_str() {
        "file" => Ok(Arc::new(FileStore::open(&config.storage.root)?)),
        "kvstore" => Ok(Arc::new(KvStore::open(&config.storage.root).await?)),
        other => Err(Error::Configuration(format!(
            "Unknown storage backend: '{}'. Must be file or kvstore.",
            other
        ))
        .into()),
    }
}
