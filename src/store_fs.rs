//! File-backed storage: one file per document under a web root.
//!
//! Layout mirrors the REST resource hierarchy the HTTP layer serves:
//!
//! ```text
//! <root>/jobs/<id>.json            per-job documents at their logical paths
//! <root>/jobs/<id>/vertices.json
//! <root>/overviews/<id>.json       per-job overview copies (aggregator input)
//! <root>/jobs/overview.json        combined listing, published atomically
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

use crate::models::JOBS_OVERVIEW_PATH;
use crate::store::HistoryStore;

pub struct FileStore {
    root: PathBuf,
    jobs_dir: PathBuf,
    overviews_dir: PathBuf,
}

impl FileStore {
    pub fn open(root: &Path) -> Result<Self> {
        let jobs_dir = root.join("jobs");
        let overviews_dir = root.join("overviews");
        std::fs::create_dir_all(&jobs_dir)
            .with_context(|| format!("Failed to create job directory: {}", jobs_dir.display()))?;
        std::fs::create_dir_all(&overviews_dir).with_context(|| {
            format!(
                "Failed to create overview directory: {}",
                overviews_dir.display()
            )
        })?;

        Ok(Self {
            root: root.to_path_buf(),
            jobs_dir,
            overviews_dir,
        })
    }

    fn overview_file(&self, job_id: &str) -> PathBuf {
        self.overviews_dir.join(format!("{job_id}.json"))
    }

    fn target_for(&self, job_id: &str, path: &str) -> PathBuf {
        if path == JOBS_OVERVIEW_PATH {
            self.overview_file(job_id)
        } else {
            let relative = path.trim_start_matches('/');
            self.root.join(format!("{relative}.json"))
        }
    }
}

fn remove_file_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
    }
}

fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
    }
}

#[async_trait]
impl HistoryStore for FileStore {
    async fn put(&self, job_id: &str, path: &str, json: &str) -> Result<()> {
        let target = self.target_for(job_id, path);
        if let Some(parent) = target.parent() {
            // There may be left-over directories from a previous attempt.
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        // Overwrite rather than append: an existing file may be an
        // incomplete leftover from a failed fetch of the same archive.
        remove_file_if_exists(&target)?;
        std::fs::write(&target, json)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        Ok(())
    }

    async fn delete_job(&self, job_id: &str) -> Result<()> {
        // The overview copy goes first so a half-deleted job can never
        // reappear in the combined listing.
        let mut first_failure = remove_file_if_exists(&self.overview_file(job_id)).err();

        if let Err(e) = remove_dir_if_exists(&self.jobs_dir.join(job_id)) {
            first_failure.get_or_insert(e);
        }
        if let Err(e) = remove_file_if_exists(&self.jobs_dir.join(format!("{job_id}.json"))) {
            first_failure.get_or_insert(e);
        }

        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn delete_overview(&self, job_id: &str) -> Result<()> {
        remove_file_if_exists(&self.overview_file(job_id))
    }

    async fn list_overviews(&self) -> Result<Vec<(String, String)>> {
        let mut overviews = Vec::new();
        for entry in std::fs::read_dir(&self.overviews_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(job_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            overviews.push((job_id.to_string(), json));
        }
        Ok(overviews)
    }

    async fn exists(&self, job_id: &str) -> Result<bool> {
        Ok(self.overview_file(job_id).exists())
    }

    async fn put_combined_overview(&self, json: &str) -> Result<()> {
        // Write-then-rename within the same directory, so readers only ever
        // see the old document or the new one.
        let target = self.jobs_dir.join("overview.json");
        let staging = self.jobs_dir.join(".overview.json.tmp");
        std::fs::write(&staging, json)
            .with_context(|| format!("Failed to write {}", staging.display()))?;
        std::fs::rename(&staging, &target)
            .with_context(|| format!("Failed to publish {}", target.display()))?;
        Ok(())
    }
}
