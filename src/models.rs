//! Core data types flowing through the fetch cycle.
//!
//! These mirror the documents the archive producer writes and the REST
//! resources the HTTP layer serves: archive bundles decompose into
//! [`ArchivedJson`] documents, and every job carries one overview document
//! deserializable as a single-entry [`JobsOverview`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Logical path of the per-job overview document (current schema).
pub const JOBS_OVERVIEW_PATH: &str = "/jobs/overview";

/// Logical path of the per-job overview document written by pre-format-change
/// producers. Migrated to the current schema on ingestion.
pub const LEGACY_OVERVIEW_PATH: &str = "/joboverview";

/// One ingestible unit discovered under a monitored location.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Opaque job identifier, derived from the entry's file name.
    pub job_id: String,
    /// Last-modified timestamp of the archive bundle.
    pub modified_at: DateTime<Utc>,
}

/// One logical document extracted from an archive bundle.
///
/// The `path` mirrors a REST resource path (e.g. `/jobs/<id>/vertices`);
/// `json` is the serialized payload served at that path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedJson {
    pub path: String,
    pub json: String,
}

/// Notification emitted at most once per cache state transition per cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEvent {
    pub job_id: String,
    pub kind: ArchiveEventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveEventKind {
    Created,
    Deleted,
}

/// Per-state task counts within a job overview (current schema).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskCounts {
    pub total: i64,
    pub created: i64,
    pub scheduled: i64,
    pub deploying: i64,
    pub running: i64,
    pub finished: i64,
    pub canceling: i64,
    pub canceled: i64,
    pub failed: i64,
}

/// One job entry in an overview document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobDetails {
    pub jid: String,
    pub name: String,
    pub state: String,
    #[serde(rename = "start-time")]
    pub start_time: i64,
    #[serde(rename = "end-time")]
    pub end_time: i64,
    pub duration: i64,
    #[serde(rename = "last-modification")]
    pub last_modification: i64,
    pub tasks: TaskCounts,
}

/// The overview listing document.
///
/// Per-job overview files use the same schema as the combined listing but
/// contain exactly one job entry; the aggregator concatenates them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobsOverview {
    pub jobs: Vec<JobDetails>,
}

/// Whether a directory entry name is a well-formed job identifier.
///
/// Producers render job ids as 32 hex characters; case is accepted either
/// way, matching the producer's hex parsing. Anything else under a monitored
/// location is a stray file and is skipped at listing time.
pub fn is_valid_job_id(name: &str) -> bool {
    name.len() == 32 && name.bytes().all(|b| b.is_ascii_hexdigit())
}
