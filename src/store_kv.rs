//! Key-value-backed storage on embedded SQLite.
//!
//! Every document is one row keyed by its logical path; per-job overview
//! copies live under the `/overviews/` prefix so the aggregator can range
//! scan them. Single-statement upserts give the atomic-publish guarantee the
//! combined overview needs.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::models::JOBS_OVERVIEW_PATH;
use crate::store::HistoryStore;

const OVERVIEW_PREFIX: &str = "/overviews/";

pub struct KvStore {
    pool: SqlitePool,
}

impl KvStore {
    /// Open (creating if missing) the document store under `root`.
    pub async fn open(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        let db_path = root.join("archive.sqlite");

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                key TEXT PRIMARY KEY,
                job_id TEXT NOT NULL,
                json TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_job_id ON documents(job_id)")
            .execute(&pool)
            .await?;

        Ok(Self { pool })
    }

    fn key_for(job_id: &str, path: &str) -> String {
        if path == JOBS_OVERVIEW_PATH {
            format!("{OVERVIEW_PREFIX}{job_id}")
        } else {
            path.to_string()
        }
    }

    async fn upsert(&self, key: &str, job_id: &str, json: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (key, job_id, json) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET job_id = excluded.job_id, json = excluded.json
            "#,
        )
        .bind(key)
        .bind(job_id)
        .bind(json)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for KvStore {
    async fn put(&self, job_id: &str, path: &str, json: &str) -> Result<()> {
        self.upsert(&Self::key_for(job_id, path), job_id, json).await
    }

    async fn delete_job(&self, job_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM documents WHERE job_id = ?")
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_overview(&self, job_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM documents WHERE key = ?")
            .bind(format!("{OVERVIEW_PREFIX}{job_id}"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_overviews(&self) -> Result<Vec<(String, String)>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT job_id, json FROM documents WHERE key LIKE ? ORDER BY key",
        )
        .bind(format!("{OVERVIEW_PREFIX}%"))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn exists(&self, job_id: &str) -> Result<bool> {
        let found: Option<String> = sqlx::query_scalar("SELECT key FROM documents WHERE key = ?")
            .bind(format!("{OVERVIEW_PREFIX}{job_id}"))
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn put_combined_overview(&self, json: &str) -> Result<()> {
        // A single upsert is atomic in SQLite; readers see old or new, never
        // a torn row.
        self.upsert(JOBS_OVERVIEW_PATH, "", json).await
    }
}
