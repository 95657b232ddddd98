//! Repository for the `query_log` audit table.

use oragate_core::query_log::QueryLog;
use sqlx::PgPool;

use crate::models::query_log::QueryLogRow;

/// Column list for `query_log` queries.
const COLUMNS: &str = "\
    log_id, query_type, query_text, params, execution_time, duration, \
    rows_affected, success, error_msg, user_ip, created_at";

/// Provides append and lookup operations for the query audit log.
pub struct QueryLogRepo;

impl QueryLogRepo {
    pub async fn insert(pool: &PgPool, log: &QueryLog) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO query_log \
                 (log_id, query_type, query_text, params, execution_time, duration, \
                  rows_affected, success, error_msg, user_ip) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(&log.id)
        .bind(&log.query_type)
        .bind(&log.query_text)
        .bind(&log.params)
        .bind(log.execution_time)
        .bind(&log.duration)
        .bind(log.rows_affected)
        .bind(log.success)
        .bind(&log.error_msg)
        .bind(&log.user_ip)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Most recent entries first.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<QueryLogRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM query_log \
             ORDER BY execution_time DESC \
             LIMIT $1"
        );
        sqlx::query_as::<_, QueryLogRow>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
