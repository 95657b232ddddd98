use axum::routing::post;
use axum::Router;

use crate::handlers::procedure;
use crate::state::AppState;

/// Routes mounted at `/procedure`.
///
/// ```text
/// POST   /          synchronous call
/// POST   /async     background call, returns a job id
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(procedure::call_procedure))
        .route("/async", post(procedure::call_procedure_async))
}
