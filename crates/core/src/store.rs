//! Persistent mirror seam.
//!
//! The job registry is authoritative; a store only receives best-effort
//! copies of its mutations and is read once at startup.

use async_trait::async_trait;

use crate::job::AsyncJob;
use crate::query_log::QueryLog;
use crate::types::Timestamp;

pub type StoreError = Box<dyn std::error::Error + Send + Sync>;
pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert_job(&self, job: &AsyncJob) -> StoreResult<()>;

    /// Overwrite the stored copy with `job`.
    async fn update_job(&self, job: &AsyncJob) -> StoreResult<()>;

    async fn delete_job(&self, id: &str) -> StoreResult<()>;

    /// Delete several jobs, returning how many rows were removed.
    async fn delete_jobs(&self, ids: &[String]) -> StoreResult<u64>;

    /// Jobs started at or after `since`.
    async fn load_since(&self, since: Timestamp) -> StoreResult<Vec<AsyncJob>>;
}

#[async_trait]
pub trait QueryLogStore: Send + Sync {
    async fn save_query_log(&self, log: &QueryLog) -> StoreResult<()>;
}
