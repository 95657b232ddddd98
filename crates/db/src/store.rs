//! [`JobStore`] and [`QueryLogStore`] over PostgreSQL.

use async_trait::async_trait;
use oragate_core::job::AsyncJob;
use oragate_core::query_log::QueryLog;
use oragate_core::store::{JobStore, QueryLogStore, StoreResult};
use oragate_core::types::Timestamp;

use crate::repositories::{JobRepo, QueryLogRepo};
use crate::DbPool;

/// Persistent mirror backed by a sqlx pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn insert_job(&self, job: &AsyncJob) -> StoreResult<()> {
        JobRepo::insert(&self.pool, job).await?;
        Ok(())
    }

    async fn update_job(&self, job: &AsyncJob) -> StoreResult<()> {
        JobRepo::upsert(&self.pool, job).await?;
        Ok(())
    }

    async fn delete_job(&self, id: &str) -> StoreResult<()> {
        JobRepo::delete(&self.pool, id).await?;
        Ok(())
    }

    async fn delete_jobs(&self, ids: &[String]) -> StoreResult<u64> {
        Ok(JobRepo::delete_many(&self.pool, ids).await?)
    }

    async fn load_since(&self, since: Timestamp) -> StoreResult<Vec<AsyncJob>> {
        let rows = JobRepo::list_since(&self.pool, since).await?;
        let mut jobs = Vec::with_capacity(rows.len());
        for row in rows {
            match AsyncJob::try_from(row) {
                Ok(job) => jobs.push(job),
                Err(e) => tracing::warn!(error = %e, "Skipping unreadable stored job"),
            }
        }
        Ok(jobs)
    }
}

#[async_trait]
impl QueryLogStore for PgStore {
    async fn save_query_log(&self, log: &QueryLog) -> StoreResult<()> {
        QueryLogRepo::insert(&self.pool, log).await?;
        Ok(())
    }
}
