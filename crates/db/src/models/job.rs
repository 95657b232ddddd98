//! Row model for the `async_jobs` table.

use oragate_core::job::{AsyncJob, JobStatus};
use oragate_core::types::Timestamp;
use serde_json::Value;
use sqlx::FromRow;

/// A row from the `async_jobs` table.
#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub job_id: String,
    pub status: String,
    pub procedure_name: String,
    pub params: Option<Value>,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub duration: Option<String>,
    pub result: Option<Value>,
    pub error_msg: Option<String>,
    pub progress: i32,
    pub created_at: Timestamp,
}

/// Raised when a stored row cannot be turned back into a job.
#[derive(Debug, thiserror::Error)]
#[error("Invalid stored job {job_id}: {reason}")]
pub struct InvalidJobRow {
    pub job_id: String,
    pub reason: String,
}

impl TryFrom<JobRow> for AsyncJob {
    type Error = InvalidJobRow;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = JobStatus::parse(&row.status).ok_or_else(|| InvalidJobRow {
            job_id: row.job_id.clone(),
            reason: format!("unknown status '{}'", row.status),
        })?;

        let result = match row.result {
            Some(Value::Object(map)) => Some(map),
            Some(Value::Null) | None => None,
            Some(other) => {
                return Err(InvalidJobRow {
                    job_id: row.job_id,
                    reason: format!("result is not an object: {other}"),
                })
            }
        };

        Ok(AsyncJob {
            id: row.job_id,
            status,
            procedure_name: row.procedure_name,
            params: row.params,
            start_time: row.start_time,
            end_time: row.end_time,
            duration: row.duration,
            result,
            error: row.error_msg,
            progress: row.progress.clamp(0, 100) as u8,
        })
    }
}
