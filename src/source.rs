//! Archive directory sources.
//!
//! An [`ArchiveSource`] is one monitored location: it lists the archive
//! entries currently present and reads individual bundles. The filesystem
//! implementation covers the standard producer layout (one bundle file per
//! job, named by the job id, directly under the monitored directory).

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::cmp::Reverse;
use std::path::PathBuf;
use tracing::debug;

use crate::error::Error;
use crate::models::{is_valid_job_id, ArchiveEntry, ArchivedJson};

/// A monitored source location: the directory handle plus whatever backend is
/// needed to list and read it.
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Identifies the location, for cache keying and log output.
    fn location(&self) -> &str;

    /// List the entries currently present.
    ///
    /// The returned order is this source's contract; the fetch cycle consumes
    /// it as-is and never re-sorts, so retention-by-count decisions follow
    /// whatever order the source defines. A failed listing means the location
    /// is unreachable, not empty.
    async fn list(&self) -> Result<Vec<ArchiveEntry>, Error>;

    /// Read and decode the bundle for one job.
    async fn read(&self, job_id: &str) -> Result<Vec<ArchivedJson>>;
}

/// Wire shape of an archive bundle: `{"archive": [{"path", "json"}, ...]}`,
/// where each `json` member is an embedded serialized document.
#[derive(Deserialize)]
struct RawBundle {
    archive: Vec<RawDocument>,
}

#[derive(Deserialize)]
struct RawDocument {
    path: String,
    json: String,
}

/// Decode a raw archive bundle into its logical documents.
pub fn decode_bundle(raw: &str) -> Result<Vec<ArchivedJson>> {
    let bundle: RawBundle =
        serde_json::from_str(raw).context("archive bundle is not valid JSON")?;
    Ok(bundle
        .archive
        .into_iter()
        .map(|doc| ArchivedJson {
            path: doc.path,
            json: doc.json,
        })
        .collect())
}

/// Filesystem-backed archive source.
///
/// `list` returns entries newest-first by modification time (ties broken by
/// job id). That ordering is the documented contract consumers of this source
/// rely on for retention decisions.
pub struct FsArchiveSource {
    root: PathBuf,
    location: String,
}

impl FsArchiveSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let location = root.display().to_string();
        Self { root, location }
    }

    fn listing_error(&self, source: anyhow::Error) -> Error {
        Error::Listing {
            location: self.root.clone(),
            source,
        }
    }
}

#[async_trait]
impl ArchiveSource for FsArchiveSource {
    fn location(&self) -> &str {
        &self.location
    }

    async fn list(&self) -> Result<Vec<ArchiveEntry>, Error> {
        let dir = std::fs::read_dir(&self.root).map_err(|e| self.listing_error(e.into()))?;

        let mut entries = Vec::new();
        for entry in dir {
            let entry = entry.map_err(|e| self.listing_error(e.into()))?;

            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            if !is_valid_job_id(&name) {
                debug!(location = %self.location, entry = %name, "skipping non-archive entry");
                continue;
            }

            let metadata = entry.metadata().map_err(|e| self.listing_error(e.into()))?;
            let modified = metadata
                .modified()
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH);

            entries.push(ArchiveEntry {
                job_id: name,
                modified_at: DateTime::<Utc>::from(modified),
            });
        }

        // Newest first; job id as a tiebreaker for deterministic ordering.
        entries.sort_by(|a, b| {
            (Reverse(a.modified_at), &a.job_id).cmp(&(Reverse(b.modified_at), &b.job_id))
        });

        Ok(entries)
    }

    async fn read(&self, job_id: &str) -> Result<Vec<ArchivedJson>> {
        let path = self.root.join(job_id);
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read archive bundle: {}", path.display()))?;
        decode_bundle(&raw)
    }
}

/// Write a bundle in the producer's wire format. Used to seed archives in
/// tests and tooling; the production producer lives on the compute side.
pub fn encode_bundle(documents: &[ArchivedJson]) -> String {
    let archive: Vec<serde_json::Value> = documents
        .iter()
        .map(|doc| {
            serde_json::json!({
                "path": doc.path,
                "json": doc.json,
            })
        })
        .collect();
    serde_json::json!({ "archive": archive }).to_string()
}
