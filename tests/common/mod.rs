#![allow(dead_code)]

//! Shared fixtures: archive bundle writers, a capturing event listener, and
//! fetcher setup over a file-backed store.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use archive_cache::config::RetentionConfig;
use archive_cache::fetcher::{ArchiveFetcher, EventListener, RefreshLocation};
use archive_cache::models::{
    ArchiveEvent, ArchiveEventKind, ArchivedJson, JobDetails, JobsOverview, TaskCounts,
    JOBS_OVERVIEW_PATH, LEGACY_OVERVIEW_PATH,
};
use archive_cache::source::{encode_bundle, FsArchiveSource};
use archive_cache::store::HistoryStore;
use archive_cache::store_fs::FileStore;

/// Deterministic 32-hex job id from a small seed.
pub fn job_id(n: u8) -> String {
    format!("{n:032x}")
}

pub fn overview_json(jid: &str, name: &str) -> String {
    let overview = JobsOverview {
        jobs: vec![JobDetails {
            jid: jid.to_string(),
            name: name.to_string(),
            state: "FINISHED".to_string(),
            start_time: 0,
            end_time: 1,
            duration: 1,
            last_modification: 1,
            tasks: TaskCounts {
                total: 1,
                finished: 1,
                ..Default::default()
            },
        }],
    };
    serde_json::to_string(&overview).unwrap()
}

fn write_bundle(dir: &Path, jid: &str, documents: &[ArchivedJson], modified_secs: u64) {
    let path = dir.join(jid);
    std::fs::write(&path, encode_bundle(documents)).unwrap();
    let file = std::fs::File::options().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(modified_secs))
        .unwrap();
}

/// Write a current-schema archive bundle for one job.
pub fn write_archive(dir: &Path, jid: &str, modified_secs: u64) {
    let documents = vec![
        ArchivedJson {
            path: JOBS_OVERVIEW_PATH.to_string(),
            json: overview_json(jid, "testjob"),
        },
        ArchivedJson {
            path: format!("/jobs/{jid}"),
            json: format!(r#"{{"jid":"{jid}"}}"#),
        },
        ArchivedJson {
            path: format!("/jobs/{jid}/vertices"),
            json: r#"{"vertices":[]}"#.to_string(),
        },
    ];
    write_bundle(dir, jid, &documents, modified_secs);
}

/// Write a pre-format-change archive bundle (merged `pending` count).
pub fn write_legacy_archive(dir: &Path, jid: &str, modified_secs: u64, pending: i64) {
    let legacy = serde_json::json!({
        "finished": [{
            "jid": jid,
            "name": "testjob",
            "state": "FINISHED",
            "start-time": 0,
            "end-time": 1,
            "duration": 1,
            "last-modification": 1,
            "tasks": {
                "total": pending,
                "pending": pending,
                "running": 0,
                "finished": 0,
                "canceling": 0,
                "canceled": 0,
                "failed": 0,
            },
        }]
    });
    let documents = vec![ArchivedJson {
        path: LEGACY_OVERVIEW_PATH.to_string(),
        json: legacy.to_string(),
    }];
    write_bundle(dir, jid, &documents, modified_secs);
}

/// Captures every event the fetcher delivers.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<ArchiveEvent>>>);

impl EventLog {
    pub fn listener(&self) -> EventListener {
        let log = self.0.clone();
        Box::new(move |event| log.lock().unwrap().push(event.clone()))
    }

    pub fn events(&self) -> Vec<ArchiveEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn ids_of_kind(&self, kind: ArchiveEventKind) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.job_id)
            .collect()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Build a fetcher over file-backed storage at `store_root`.
pub fn new_fetcher(
    archive_dirs: &[&Path],
    store_root: &Path,
    retention: RetentionConfig,
) -> (ArchiveFetcher, Arc<FileStore>, EventLog) {
    let store = Arc::new(FileStore::open(store_root).unwrap());
    let locations: Vec<RefreshLocation> = archive_dirs
        .iter()
        .map(|dir| Arc::new(FsArchiveSource::new(*dir)) as RefreshLocation)
        .collect();
    let log = EventLog::default();
    let fetcher = ArchiveFetcher::new(
        locations,
        &retention,
        store.clone() as Arc<dyn HistoryStore>,
        log.listener(),
    )
    .unwrap();
    (fetcher, store, log)
}

/// Job ids listed in the combined overview document, sorted.
pub fn combined_jobs(store_root: &Path) -> Vec<String> {
    let json = std::fs::read_to_string(store_root.join("jobs/overview.json")).unwrap();
    let overview: JobsOverview = serde_json::from_str(&json).unwrap();
    let mut ids: Vec<String> = overview.jobs.into_iter().map(|j| j.jid).collect();
    ids.sort();
    ids
}
