//! In-memory job registry with a best-effort persistent mirror.
//!
//! The map behind the [`RwLock`] is the only authoritative copy of a job.
//! Every mutation is followed by a fire-and-forget write to the
//! [`JobStore`]; a failed write is logged and never rolled back. Mirror
//! writes are independent tasks, so two writes for the same job may land in
//! the store out of order.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use oragate_core::error::CoreError;
use oragate_core::job::{AsyncJob, JobFilter, REHYDRATE_WINDOW_HOURS};
use oragate_core::store::{JobStore, StoreResult};
use oragate_core::types::{JobId, Timestamp};
use tokio::sync::RwLock;

pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, AsyncJob>>,
    store: Option<Arc<dyn JobStore>>,
}

impl JobRegistry {
    pub fn new(store: Option<Arc<dyn JobStore>>) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            store,
        }
    }

    /// A registry without a persistent mirror.
    pub fn in_memory() -> Self {
        Self::new(None)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn get(&self, id: &str) -> Option<AsyncJob> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Snapshot of every job, newest first.
    pub async fn list(&self) -> Vec<AsyncJob> {
        let mut jobs: Vec<AsyncJob> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| b.start_time.cmp(&a.start_time).then_with(|| a.id.cmp(&b.id)));
        jobs
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Register a new job.
    pub async fn create(&self, job: AsyncJob) -> AsyncJob {
        self.jobs.write().await.insert(job.id.clone(), job.clone());
        tracing::debug!(job_id = %job.id, procedure = %job.procedure_name, "Job created");

        if let Some(store) = self.mirror() {
            let copy = job.clone();
            spawn_mirror("insert", job.id.clone(), async move {
                store.insert_job(&copy).await
            });
        }
        job
    }

    /// Apply `apply` to a job and return the new state.
    ///
    /// Terminal jobs are refused with [`CoreError::Conflict`]. `apply` runs on
    /// a copy, so an error from it leaves the stored job untouched.
    pub async fn update<F>(&self, id: &str, apply: F) -> Result<AsyncJob, CoreError>
    where
        F: FnOnce(&mut AsyncJob) -> Result<(), CoreError>,
    {
        let updated = {
            let mut jobs = self.jobs.write().await;
            let current = jobs.get(id).ok_or_else(|| CoreError::job_not_found(id))?;
            if current.is_terminal() {
                return Err(CoreError::Conflict(format!(
                    "Job {id} is already {} and cannot be modified",
                    current.status
                )));
            }

            let mut next = current.clone();
            apply(&mut next)?;
            jobs.insert(id.to_string(), next.clone());
            next
        };

        if let Some(store) = self.mirror() {
            let copy = updated.clone();
            spawn_mirror("update", updated.id.clone(), async move {
                store.update_job(&copy).await
            });
        }
        Ok(updated)
    }

    /// Remove one job.
    pub async fn delete(&self, id: &str) -> Result<AsyncJob, CoreError> {
        let removed = self
            .jobs
            .write()
            .await
            .remove(id)
            .ok_or_else(|| CoreError::job_not_found(id))?;

        if let Some(store) = self.mirror() {
            let job_id = id.to_string();
            spawn_mirror("delete", job_id.clone(), async move {
                store.delete_job(&job_id).await
            });
        }
        Ok(removed)
    }

    /// Remove every job matching `filter`, returning the removed ids.
    pub async fn delete_matching(&self, filter: &JobFilter, now: Timestamp) -> Vec<JobId> {
        let removed: Vec<JobId> = {
            let mut jobs = self.jobs.write().await;
            let ids: Vec<JobId> = jobs
                .values()
                .filter(|job| filter.matches(job, now))
                .map(|job| job.id.clone())
                .collect();
            for id in &ids {
                jobs.remove(id);
            }
            ids
        };

        if !removed.is_empty() {
            if let Some(store) = self.mirror() {
                let ids = removed.clone();
                spawn_mirror("bulk_delete", format!("{} jobs", ids.len()), async move {
                    store.delete_jobs(&ids).await.map(|_| ())
                });
            }
        }
        removed
    }

    /// Evict finished jobs whose `end_time` is older than `retention`.
    ///
    /// Memory only: the persistent copy is kept.
    pub async fn sweep(&self, now: Timestamp, retention: chrono::Duration) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| !job.retention_expired(now, retention));
        before - jobs.len()
    }

    /// Load recent jobs from the store. Jobs already in memory win.
    ///
    /// Jobs that were still pending or running when the previous process
    /// stopped come back in that state; nothing resumes them.
    pub async fn rehydrate(&self) -> StoreResult<usize> {
        let Some(store) = self.mirror() else {
            return Ok(0);
        };

        let since = Utc::now() - chrono::Duration::hours(REHYDRATE_WINDOW_HOURS);
        let loaded = store.load_since(since).await?;

        let mut jobs = self.jobs.write().await;
        let mut restored = 0;
        for job in loaded {
            if !jobs.contains_key(&job.id) {
                jobs.insert(job.id.clone(), job);
                restored += 1;
            }
        }
        Ok(restored)
    }

    fn mirror(&self) -> Option<Arc<dyn JobStore>> {
        self.store.as_ref().map(Arc::clone)
    }
}

/// Run a mirror write in the background, logging failures.
fn spawn_mirror<Fut>(op: &'static str, target: String, write: Fut)
where
    Fut: Future<Output = StoreResult<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = write.await {
            tracing::warn!(op, target = %target, error = %e, "Job mirror write failed");
        }
    });
}
