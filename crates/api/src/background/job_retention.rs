//! Periodic eviction of finished async jobs from memory.
//!
//! Runs on a fixed interval using `tokio::time::interval`. Only jobs whose
//! `end_time` is older than the retention window are evicted; pending and
//! running jobs stay regardless of age. The persistent mirror is untouched.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::jobs::JobRegistry;

/// Run the job retention loop until `cancel` is triggered.
pub async fn run(
    registry: Arc<JobRegistry>,
    retention_hours: i64,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        retention_hours,
        interval_secs = interval.as_secs(),
        "Job retention sweeper started"
    );

    let retention = chrono::Duration::hours(retention_hours);
    let mut interval = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Job retention sweeper stopping");
                break;
            }
            _ = interval.tick() => {
                let evicted = registry.sweep(Utc::now(), retention).await;
                if evicted > 0 {
                    tracing::info!(evicted, "Job retention: evicted finished jobs");
                } else {
                    tracing::debug!("Job retention: nothing to evict");
                }
            }
        }
    }
}
