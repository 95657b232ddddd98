//! Handlers for inspecting and deleting async jobs.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use oragate_core::error::CoreError;
use oragate_core::job::JobFilter;
use serde::Deserialize;
use serde_json::json;

use crate::error::AppResult;
use crate::state::AppState;

/// Query parameters for `DELETE /jobs`.
#[derive(Debug, Deserialize)]
pub struct DeleteJobsQuery {
    /// Comma-separated statuses.
    pub status: Option<String>,
    /// Age threshold in days, matched against `start_time`.
    pub older_than: Option<String>,
}

/// GET /jobs
pub async fn list_jobs(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let jobs = state.jobs.list().await;
    Ok(Json(json!({ "total": jobs.len(), "jobs": jobs })))
}

/// GET /jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let job = state
        .jobs
        .get(&job_id)
        .await
        .ok_or_else(|| CoreError::job_not_found(&job_id))?;
    Ok(Json(job))
}

/// DELETE /jobs/{id}
pub async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.jobs.delete(&job_id).await?;
    tracing::info!(job_id = %job_id, "Job deleted");
    Ok(Json(json!({
        "message": "Job deleted successfully",
        "job_id": job_id,
    })))
}

/// DELETE /jobs?status=a,b&older_than=N
///
/// At least one filter is required. With `status` present only the status
/// decides; otherwise jobs started more than `older_than` days ago go.
pub async fn delete_jobs(
    State(state): State<AppState>,
    Query(query): Query<DeleteJobsQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = JobFilter::from_query(query.status.as_deref(), query.older_than.as_deref())?;
    let removed = state.jobs.delete_matching(&filter, Utc::now()).await;
    tracing::info!(deleted = removed.len(), "Jobs bulk-deleted");

    Ok(Json(json!({
        "message": "Jobs deleted successfully",
        "deleted": removed.len(),
    })))
}
