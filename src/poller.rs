//! Scheduling wrapper around the fetch cycle.
//!
//! One periodic task plus an on-demand trigger drive the same entry point.
//! Cycles are mutually exclusive: the fetcher sits behind a mutex, so a
//! trigger arriving while a cycle is in flight waits for it to finish rather
//! than running concurrently. Pending triggers coalesce into a single extra
//! cycle.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::fetcher::ArchiveFetcher;

pub struct Poller {
    fetcher: Arc<Mutex<ArchiveFetcher>>,
    interval: Duration,
    trigger_tx: mpsc::Sender<()>,
    trigger_rx: mpsc::Receiver<()>,
}

impl Poller {
    pub fn new(fetcher: ArchiveFetcher, interval: Duration) -> Self {
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        Self {
            fetcher: Arc::new(Mutex::new(fetcher)),
            interval,
            trigger_tx,
            trigger_rx,
        }
    }

    /// Handle for requesting an immediate extra cycle.
    pub fn trigger(&self) -> PollTrigger {
        PollTrigger {
            tx: self.trigger_tx.clone(),
        }
    }

    /// Poll until the task is dropped: one cycle per tick, plus one per
    /// trigger. Publishes an initial combined overview before the first
    /// cycle.
    pub async fn run(mut self) {
        self.fetcher.lock().await.prime().await;

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = self.interval.as_secs(), "starting archive poller");

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                Some(()) = self.trigger_rx.recv() => {
                    debug!("on-demand archive fetch triggered");
                }
            }
            self.fetcher.lock().await.fetch_archives().await;
        }
    }
}

/// Cloneable on-demand trigger for a running [`Poller`].
#[derive(Clone)]
pub struct PollTrigger {
    tx: mpsc::Sender<()>,
}

impl PollTrigger {
    /// Request an immediate cycle. If one is already pending the request is
    /// coalesced, never queued up.
    pub fn fire(&self) {
        let _ = self.tx.try_send(());
    }
}
