//! Async job model and state machine.
//!
//! `Pending -> Running -> {Completed | Failed}`. Terminal states absorb:
//! every transition on a terminal job is refused with
//! [`CoreError::Conflict`] and leaves the record untouched. Progress never
//! decreases.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::OutValues;
use crate::error::CoreError;
use crate::types::{JobId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Progress of a freshly created job.
pub const PROGRESS_CREATED: u8 = 0;
/// Progress once the runner picked the job up.
pub const PROGRESS_DISPATCHED: u8 = 10;
/// Progress once arguments are bound.
pub const PROGRESS_BOUND: u8 = 30;
/// Progress once the statement is sent to the backend.
pub const PROGRESS_EXECUTING: u8 = 50;
/// Progress once OUT values are read back.
pub const PROGRESS_HARVESTED: u8 = 80;
/// Progress of every terminal job.
pub const PROGRESS_DONE: u8 = 100;

/// Jobs started within this window are reloaded from the store on startup.
pub const REHYDRATE_WINDOW_HOURS: i64 = 24;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Parse a stored or query-string status, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "pending" => Some(JobStatus::Pending),
            "running" => Some(JobStatus::Running),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// A background invocation tracked by the job registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsyncJob {
    pub id: JobId,
    pub status: JobStatus,
    pub procedure_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    pub start_time: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<OutValues>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub progress: u8,
}

/// Generate a fresh job id: 32 lowercase hex characters.
pub fn new_job_id() -> JobId {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Render an elapsed time the way it is stored on the job, e.g. `1.5s`.
pub fn format_duration(elapsed: Duration) -> String {
    format!("{elapsed:?}")
}

impl AsyncJob {
    /// A new pending job at progress 0.
    pub fn new(
        id: JobId,
        procedure_name: impl Into<String>,
        params: Option<Value>,
        start_time: Timestamp,
    ) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            procedure_name: procedure_name.into(),
            params,
            start_time,
            end_time: None,
            duration: None,
            result: None,
            error: None,
            progress: PROGRESS_CREATED,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn ensure_open(&self) -> Result<(), CoreError> {
        if self.is_terminal() {
            return Err(CoreError::Conflict(format!(
                "Job {} is already {}",
                self.id, self.status
            )));
        }
        Ok(())
    }

    /// `Pending -> Running` at the dispatch checkpoint.
    pub fn mark_running(&mut self) -> Result<(), CoreError> {
        self.ensure_open()?;
        self.status = JobStatus::Running;
        self.progress = self.progress.max(PROGRESS_DISPATCHED);
        Ok(())
    }

    /// Record a checkpoint. Lower values than the current progress are
    /// ignored.
    pub fn advance(&mut self, progress: u8) -> Result<(), CoreError> {
        self.ensure_open()?;
        self.progress = self.progress.max(progress.min(PROGRESS_DONE));
        Ok(())
    }

    /// Terminal success with the harvested OUT values.
    pub fn complete(&mut self, result: OutValues, now: Timestamp) -> Result<(), CoreError> {
        self.ensure_open()?;
        self.finish(JobStatus::Completed, now);
        self.result = Some(result);
        Ok(())
    }

    /// Terminal failure with a user-facing message.
    pub fn fail(&mut self, error: impl Into<String>, now: Timestamp) -> Result<(), CoreError> {
        self.ensure_open()?;
        self.finish(JobStatus::Failed, now);
        self.error = Some(error.into());
        Ok(())
    }

    fn finish(&mut self, status: JobStatus, now: Timestamp) {
        let elapsed = (now - self.start_time).to_std().unwrap_or_default();
        self.status = status;
        self.end_time = Some(now);
        self.duration = Some(format_duration(elapsed));
        self.progress = PROGRESS_DONE;
    }

    /// Whether the retention sweeper may evict this job: it must have ended,
    /// and more than `retention` ago.
    pub fn retention_expired(&self, now: Timestamp, retention: chrono::Duration) -> bool {
        match self.end_time {
            Some(end) => now - end > retention,
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Bulk-delete filter
// ---------------------------------------------------------------------------

/// Selection for `DELETE /jobs`.
///
/// When `statuses` is present it decides on its own; otherwise jobs started
/// more than `older_than_days` days ago match, whatever their status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFilter {
    statuses: Option<Vec<JobStatus>>,
    older_than_days: Option<u32>,
}

impl JobFilter {
    /// Build a filter; at least one criterion is required. An empty status
    /// list and an age of zero days both count as absent.
    pub fn new(
        statuses: Option<Vec<JobStatus>>,
        older_than_days: Option<u32>,
    ) -> Result<Self, CoreError> {
        let statuses = statuses.filter(|s| !s.is_empty());
        let older_than_days = older_than_days.filter(|days| *days > 0);
        if statuses.is_none() && older_than_days.is_none() {
            return Err(CoreError::Validation(
                "At least one filter is required: status or older_than".into(),
            ));
        }
        Ok(Self {
            statuses,
            older_than_days,
        })
    }

    /// Parse the raw query-string values (`status=a,b`, `older_than=N`).
    pub fn from_query(status: Option<&str>, older_than: Option<&str>) -> Result<Self, CoreError> {
        let statuses = match status.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| {
                        JobStatus::parse(s).ok_or_else(|| {
                            CoreError::Validation(format!("Invalid status filter: {s}"))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };

        let older_than_days = match older_than.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(raw.parse::<u32>().map_err(|_| {
                CoreError::Validation(
                    "older_than must be a non-negative integer number of days".into(),
                )
            })?),
            None => None,
        };

        Self::new(statuses, older_than_days)
    }

    pub fn statuses(&self) -> Option<&[JobStatus]> {
        self.statuses.as_deref()
    }

    pub fn older_than_days(&self) -> Option<u32> {
        self.older_than_days
    }

    pub fn matches(&self, job: &AsyncJob, now: Timestamp) -> bool {
        if let Some(statuses) = &self.statuses {
            return statuses.contains(&job.status);
        }
        match self.older_than_days {
            // A cutoff before the earliest representable instant matches nothing.
            Some(days) => chrono::Duration::try_days(i64::from(days))
                .and_then(|age| now.checked_sub_signed(age))
                .is_some_and(|cutoff| job.start_time < cutoff),
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
