//! Combined overview aggregation.
//!
//! Every ingested job stores one single-entry overview document; the HTTP
//! layer serves one combined listing over all of them. The combined document
//! is always rebuilt in full — the job set is small enough that correctness
//! beats incremental patching.

use anyhow::Result;
use tracing::warn;

use crate::models::JobsOverview;
use crate::store::HistoryStore;

/// Rebuild the combined overview from every stored per-job overview and
/// publish it atomically.
///
/// A per-job document that fails to deserialize is skipped with a warning:
/// one corrupt cached document must not blank out the entire listing.
pub async fn rebuild(store: &dyn HistoryStore) -> Result<()> {
    let mut combined = JobsOverview::default();

    for (job_id, json) in store.list_overviews().await? {
        match serde_json::from_str::<JobsOverview>(&json) {
            Ok(mut single) => combined.jobs.append(&mut single.jobs),
            Err(err) => {
                warn!(job_id = %job_id, error = %err, "skipping unreadable overview document");
            }
        }
    }

    let json = serde_json::to_string(&combined)?;
    store.put_combined_overview(&json).await
}
