//! The fetch cycle: one reconciliation pass over every monitored location.
//!
//! Each cycle discovers new archives, ingests them into the storage backend,
//! evicts entries beyond the retention limit and entries whose source archive
//! disappeared, rebuilds the combined overview when anything changed, and
//! finally delivers CREATED/DELETED events to the registered listener.
//!
//! A cycle runs to completion or fails outright; any failure is caught at the
//! top level and logged so the scheduler is never brought down. The cycle is
//! the only mutator of [`CacheState`] and the only writer of the store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error, info, trace, warn};

use crate::cache::CacheState;
use crate::config::{RetentionConfig, UNBOUNDED_HISTORY};
use crate::error::Error;
use crate::legacy;
use crate::models::{ArchiveEvent, ArchiveEventKind, JOBS_OVERVIEW_PATH, LEGACY_OVERVIEW_PATH};
use crate::overview;
use crate::source::ArchiveSource;
use crate::store::HistoryStore;

/// One monitored source location: a directory handle plus the backend needed
/// to list and read it. Shared read-only across cycles.
pub type RefreshLocation = Arc<dyn ArchiveSource>;

/// Callback invoked once per [`ArchiveEvent`], synchronously, in emission
/// order. A slow listener delays subsequent cycles; listeners that need to do
/// real work should hand off to their own queue.
pub type EventListener = Box<dyn Fn(&ArchiveEvent) + Send + Sync>;

pub struct ArchiveFetcher {
    locations: Vec<RefreshLocation>,
    store: Arc<dyn HistoryStore>,
    cache: CacheState,
    listener: EventListener,
    retained_jobs: i64,
    evict_beyond_limit: bool,
    cleanup_expired: bool,
}

impl ArchiveFetcher {
    /// Build a fetcher over the given locations.
    ///
    /// Rejects invalid retention limits here, before any cycle can run:
    /// retention must be at least 1 or the unbounded sentinel, never zero and
    /// never silently disabled.
    pub fn new(
        locations: Vec<RefreshLocation>,
        retention: &RetentionConfig,
        store: Arc<dyn HistoryStore>,
        listener: EventListener,
    ) -> Result<Self, Error> {
        let retained = retention.retained_jobs;
        if retained == 0 || retained < UNBOUNDED_HISTORY {
            return Err(Error::Configuration(format!(
                "retention.retained_jobs must be at least 1, or {} for unbounded history, got {}",
                UNBOUNDED_HISTORY, retained
            )));
        }

        let mut cache = CacheState::new();
        for location in &locations {
            info!(location = %location.location(), "monitoring location for archived jobs");
            cache.register(location.location());
        }

        Ok(Self {
            locations,
            store,
            cache,
            listener,
            retained_jobs: retained,
            evict_beyond_limit: retention.evict_beyond_limit && retained != UNBOUNDED_HISTORY,
            cleanup_expired: retention.cleanup_expired,
        })
    }

    /// Rebuild the combined overview from whatever the store already holds.
    ///
    /// Run once before the first cycle (see [`Poller::run`](crate::poller::Poller::run))
    /// so readers never observe a missing listing document.
    pub async fn prime(&self) {
        if let Err(err) = overview::rebuild(self.store.as_ref()).await {
            error!(error = ?err, "failed to publish initial overview");
        }
    }

    /// Run one reconciliation cycle.
    ///
    /// Never propagates an error: a single cycle's failure is logged and the
    /// next scheduled cycle proceeds from the surviving cache state.
    pub async fn fetch_archives(&mut self) {
        if let Err(err) = self.run_cycle().await {
            error!(error = ?err, "critical failure while fetching archives");
        }
    }

    async fn run_cycle(&mut self) -> Result<()> {
        debug!("starting archive fetch");
        let locations = self.locations.clone();
        let mut events: Vec<ArchiveEvent> = Vec::new();

        // Candidate removal sets: every cached id starts as a candidate and
        // is cleared as soon as the listing shows it still exists upstream.
        let mut to_remove: HashMap<String, HashSet<String>> = locations
            .iter()
            .map(|loc| (loc.location().to_string(), self.cache.snapshot(loc.location())))
            .collect();
        let mut beyond_limit: Vec<(String, String)> = Vec::new();

        for location in &locations {
            let loc_key = location.location().to_string();
            debug!(location = %loc_key, "checking archive location");

            let entries = match location.list().await {
                Ok(entries) => entries,
                Err(err) => {
                    // Possibly a concurrent deletion of the whole location.
                    // Unknown state is not "empty": evict nothing from here
                    // this cycle and retry on the next one.
                    error!(location = %loc_key, error = %err, "failed to access archive location");
                    to_remove.remove(&loc_key);
                    continue;
                }
            };

            let mut seen: i64 = 0;
            for entry in entries {
                let job_id = entry.job_id;
                if let Some(candidates) = to_remove.get_mut(&loc_key) {
                    candidates.remove(&job_id);
                }

                // Retention counts entries as the source listed them; the
                // listing order is authoritative (no re-sorting here).
                seen += 1;
                if self.evict_beyond_limit && seen > self.retained_jobs {
                    beyond_limit.push((loc_key.clone(), job_id));
                    continue;
                }

                if self.cache.contains(&loc_key, &job_id) {
                    trace!(job_id = %job_id, "archive already fetched, ignoring");
                    continue;
                }

                info!(job_id = %job_id, location = %loc_key, "processing archive");
                match self.process_archive(location.as_ref(), &job_id).await {
                    Ok(()) => {
                        self.cache.mark_ingested(&loc_key, &job_id);
                        events.push(ArchiveEvent {
                            job_id,
                            kind: ArchiveEventKind::Created,
                        });
                    }
                    Err(err) => {
                        error!(job_id = %job_id, error = ?err, "failed to fetch or process archive");
                        // Roll back whatever documents were written before
                        // the failure; the id stays unmarked and is retried
                        // next cycle.
                        if let Err(cleanup_err) = self.store.delete_job(&job_id).await {
                            warn!(job_id = %job_id, error = ?cleanup_err,
                                "could not clean up partially ingested archive");
                        }
                    }
                }
            }
        }

        // Size-limit evictions first, then disappearance evictions, each in
        // decision order. Stable cycle to cycle.
        if self.evict_beyond_limit {
            for (loc_key, job_id) in beyond_limit {
                debug!(job_id = %job_id, "evicting archive beyond retention limit");
                self.evict(&loc_key, &job_id, &mut events).await;
            }
        }

        if self.cleanup_expired {
            for location in &locations {
                let Some(stale) = to_remove.get(location.location()) else {
                    continue;
                };
                let mut stale: Vec<&String> = stale.iter().collect();
                stale.sort();
                for job_id in stale {
                    info!(job_id = %job_id, "archive disappeared from source, evicting");
                    let job_id = job_id.clone();
                    self.evict(location.location(), &job_id, &mut events).await;
                }
            }
        }

        // Rebuild before notifying, so a listener querying on an event
        // observes a listing consistent with that event. A failed rebuild
        // must not swallow the queued events: the cache is already updated
        // and no later cycle would re-announce them, so log and deliver.
        // The listing catches up the next time it is rebuilt.
        if !events.is_empty() {
            if let Err(err) = overview::rebuild(self.store.as_ref()).await {
                error!(error = ?err, "failed to update job overview");
            }
        }
        for event in &events {
            (self.listener)(event);
        }

        debug!("finished archive fetch");
        Ok(())
    }

    async fn process_archive(&self, source: &dyn ArchiveSource, job_id: &str) -> Result<()> {
        for doc in source.read(job_id).await? {
            if doc.path == LEGACY_OVERVIEW_PATH {
                debug!(job_id = %job_id, "migrating legacy overview document");
                let json = legacy::convert_legacy_overview(&doc.json)?;
                self.store.put(job_id, JOBS_OVERVIEW_PATH, &json).await?;
            } else {
                self.store.put(job_id, &doc.path, &doc.json).await?;
            }
        }
        Ok(())
    }

    async fn evict(&mut self, location: &str, job_id: &str, events: &mut Vec<ArchiveEvent>) {
        if let Err(source) = self.store.delete_job(job_id).await {
            // Non-fatal housekeeping: the id leaves the cache either way and
            // will not be re-offered for deletion.
            let err = Error::Housekeeping {
                job_id: job_id.to_string(),
                source,
            };
            warn!(error = ?err, "failed to delete cached job files");
        }
        self.cache.mark_evicted(location, job_id);
        events.push(ArchiveEvent {
            job_id: job_id.to_string(),
            kind: ArchiveEventKind::Deleted,
        });
    }
}
