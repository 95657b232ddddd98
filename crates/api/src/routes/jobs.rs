use axum::routing::get;
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// GET    /          list (newest first)
/// DELETE /          bulk delete (?status=, ?older_than=)
/// GET    /{id}      get
/// DELETE /{id}      delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(jobs::list_jobs).delete(jobs::delete_jobs))
        .route("/{id}", get(jobs::get_job).delete(jobs::delete_job))
}
