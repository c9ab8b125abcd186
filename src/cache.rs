//! In-memory record of which jobs have been ingested from each location.
//!
//! Mutated only by the fetch cycle; every operation is pure bookkeeping with
//! no I/O. The cycle snapshots a location's id set at the start of a pass and
//! iterates the copy while the live set is updated, so "still present
//! upstream" ids can be pruned from the snapshot without aliasing issues.

use std::collections::{HashMap, HashSet};

/// Per-location sets of already-ingested job ids.
///
/// Invariant: an id is in a location's set exactly when its extracted
/// documents exist in the storage backend. Ingestion failures restore the
/// invariant by rolling back documents before the id would be marked.
#[derive(Debug, Default)]
pub struct CacheState {
    ingested: HashMap<String, HashSet<String>>,
}

impl CacheState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a location known so that `snapshot` returns an empty set rather
    /// than nothing before its first cycle.
    pub fn register(&mut self, location: &str) {
        self.ingested.entry(location.to_string()).or_default();
    }

    /// Copy of the ingested id set for one location.
    pub fn snapshot(&self, location: &str) -> HashSet<String> {
        self.ingested.get(location).cloned().unwrap_or_default()
    }

    pub fn contains(&self, location: &str, job_id: &str) -> bool {
        self.ingested
            .get(location)
            .is_some_and(|ids| ids.contains(job_id))
    }

    pub fn mark_ingested(&mut self, location: &str, job_id: &str) {
        self.ingested
            .entry(location.to_string())
            .or_default()
            .insert(job_id.to_string());
    }

    pub fn mark_evicted(&mut self, location: &str, job_id: &str) {
        if let Some(ids) = self.ingested.get_mut(location) {
            ids.remove(job_id);
        }
    }
}
