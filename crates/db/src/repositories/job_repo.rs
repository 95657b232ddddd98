//! Repository for the `async_jobs` table.
//!
//! Rows are full snapshots of an [`AsyncJob`]; every write replaces the
//! whole record.

use oragate_core::job::AsyncJob;
use oragate_core::types::Timestamp;
use serde_json::Value;
use sqlx::PgPool;

use crate::models::job::JobRow;

/// Column list for `async_jobs` queries.
const COLUMNS: &str = "\
    job_id, status, procedure_name, params, start_time, end_time, \
    duration, result, error_msg, progress, created_at";

/// Provides persistence for async job snapshots.
pub struct JobRepo;

fn result_json(job: &AsyncJob) -> Option<Value> {
    job.result.clone().map(Value::Object)
}

impl JobRepo {
    /// Insert a new job. An existing row with the same id is left alone.
    pub async fn insert(pool: &PgPool, job: &AsyncJob) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO async_jobs \
                 (job_id, status, procedure_name, params, start_time, end_time, \
                  duration, result, error_msg, progress) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (job_id) DO NOTHING",
        )
        .bind(&job.id)
        .bind(job.status.as_str())
        .bind(&job.procedure_name)
        .bind(&job.params)
        .bind(job.start_time)
        .bind(job.end_time)
        .bind(&job.duration)
        .bind(result_json(job))
        .bind(&job.error)
        .bind(i32::from(job.progress))
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Overwrite the stored snapshot, creating the row if the insert has not
    /// landed yet.
    pub async fn upsert(pool: &PgPool, job: &AsyncJob) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO async_jobs \
                 (job_id, status, procedure_name, params, start_time, end_time, \
                  duration, result, error_msg, progress) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (job_id) DO UPDATE SET \
                 status = EXCLUDED.status, \
                 end_time = EXCLUDED.end_time, \
                 duration = EXCLUDED.duration, \
                 result = EXCLUDED.result, \
                 error_msg = EXCLUDED.error_msg, \
                 progress = EXCLUDED.progress, \
                 updated_at = NOW()",
        )
        .bind(&job.id)
        .bind(job.status.as_str())
        .bind(&job.procedure_name)
        .bind(&job.params)
        .bind(job.start_time)
        .bind(job.end_time)
        .bind(&job.duration)
        .bind(result_json(job))
        .bind(&job.error)
        .bind(i32::from(job.progress))
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Find a job by id.
    pub async fn find_by_id(pool: &PgPool, job_id: &str) -> Result<Option<JobRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM async_jobs WHERE job_id = $1");
        sqlx::query_as::<_, JobRow>(&query)
            .bind(job_id)
            .fetch_optional(pool)
            .await
    }

    /// Jobs started at or after `since`, newest first.
    pub async fn list_since(pool: &PgPool, since: Timestamp) -> Result<Vec<JobRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM async_jobs \
             WHERE start_time >= $1 \
             ORDER BY start_time DESC"
        );
        sqlx::query_as::<_, JobRow>(&query)
            .bind(since)
            .fetch_all(pool)
            .await
    }

    /// Delete one job. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, job_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM async_jobs WHERE job_id = $1")
            .bind(job_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every listed job, returning the number of rows removed.
    pub async fn delete_many(pool: &PgPool, job_ids: &[String]) -> Result<u64, sqlx::Error> {
        if job_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM async_jobs WHERE job_id = ANY($1)")
            .bind(job_ids)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
