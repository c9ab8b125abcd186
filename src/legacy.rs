//! Migration of pre-format-change overview documents.
//!
//! Early producers wrote the per-job overview at `/joboverview` with a single
//! merged `pending` task count. Later schemas split `pending` into `created`,
//! `scheduled`, and `deploying`. Conversion attributes the whole merged count
//! to `scheduled` — a deliberately lossy mapping that keeps the total number
//! of task states correct.

use serde_json::Value;

use crate::error::Error;
use crate::models::{JobDetails, JobsOverview, TaskCounts};

/// Convert a legacy overview document to the current schema.
///
/// The input must describe exactly the one finished job the bundle
/// represents; an absent or empty `finished` array is a
/// [`MalformedArchive`](Error::MalformedArchive) error.
pub fn convert_legacy_overview(raw: &str) -> Result<String, Error> {
    let root: Value = serde_json::from_str(raw)
        .map_err(|e| Error::MalformedArchive(format!("overview is not valid JSON: {e}")))?;

    let job = root
        .get("finished")
        .and_then(|f| f.as_array())
        .and_then(|jobs| jobs.first())
        .ok_or_else(|| {
            Error::MalformedArchive("expected a non-empty 'finished' job array".to_string())
        })?;

    let tasks = job
        .get("tasks")
        .filter(|t| t.is_object())
        .ok_or_else(|| Error::MalformedArchive("missing 'tasks' object".to_string()))?;

    // Documents older than the task-state split carry a merged `pending`
    // count covering created/scheduled/deploying. To keep the total number
    // of task states correct we attribute all of it to `scheduled`.
    let (created, scheduled, deploying) = match tasks.get("pending") {
        Some(pending) => (0, int_value(pending, "tasks.pending")?, 0),
        None => (
            int_field(tasks, "created")?,
            int_field(tasks, "scheduled")?,
            int_field(tasks, "deploying")?,
        ),
    };

    let details = JobDetails {
        jid: str_field(job, "jid")?,
        name: str_field(job, "name")?,
        state: str_field(job, "state")?,
        start_time: int_field(job, "start-time")?,
        end_time: int_field(job, "end-time")?,
        duration: int_field(job, "duration")?,
        last_modification: int_field(job, "last-modification")?,
        tasks: TaskCounts {
            total: int_field(tasks, "total")?,
            created,
            scheduled,
            deploying,
            running: int_field(tasks, "running")?,
            finished: int_field(tasks, "finished")?,
            canceling: int_field(tasks, "canceling")?,
            canceled: int_field(tasks, "canceled")?,
            failed: int_field(tasks, "failed")?,
        },
    };

    let overview = JobsOverview {
        jobs: vec![details],
    };
    serde_json::to_string(&overview)
        .map_err(|e| Error::MalformedArchive(format!("failed to serialize overview: {e}")))
}

fn str_field(value: &Value, name: &str) -> Result<String, Error> {
    value
        .get(name)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| Error::MalformedArchive(format!("missing string field '{name}'")))
}

fn int_field(value: &Value, name: &str) -> Result<i64, Error> {
    value
        .get(name)
        .ok_or_else(|| Error::MalformedArchive(format!("missing numeric field '{name}'")))
        .and_then(|v| int_value(v, name))
}

fn int_value(value: &Value, name: &str) -> Result<i64, Error> {
    value
        .as_i64()
        .ok_or_else(|| Error::MalformedArchive(format!("field '{name}' is not an integer")))
}
