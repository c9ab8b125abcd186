//! Error taxonomy for the archive cache.
//!
//! Each variant maps to a distinct recovery policy in the fetch cycle:
//! listing failures suppress eviction for the affected location, ingestion
//! failures roll back and retry next cycle, housekeeping failures are logged
//! and forgotten, and configuration failures are fatal at startup.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A monitored location could not be listed this cycle.
    ///
    /// Never treated as "the directory is empty": the cycle skips all
    /// eviction decisions for the location and retries on the next tick.
    #[error("failed to list archive location {location}")]
    Listing {
        location: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// An archive bundle could not be read, decoded, or written out.
    ///
    /// Partial writes are rolled back and the job is retried next cycle.
    #[error("failed to ingest archive for job {job_id}")]
    Ingestion {
        job_id: String,
        #[source]
        source: anyhow::Error,
    },

    /// A legacy overview document did not have the expected shape.
    ///
    /// Treated like an ingestion failure by the fetch cycle.
    #[error("malformed archive: {0}")]
    MalformedArchive(String),

    /// Invalid retention or storage parameters. Raised at startup, never at
    /// cycle time.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A best-effort deletion failed. Logged only, never propagated and
    /// never retried.
    #[error("housekeeping failed for job {job_id}")]
    Housekeeping {
        job_id: String,
        #[source]
        source: anyhow::Error,
    },
}
