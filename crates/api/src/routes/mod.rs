pub mod health;
pub mod jobs;
pub mod procedure;

use axum::middleware;
use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

/// Build the authenticated route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ping                      backend round trip
/// /procedure                 sync call (POST)
/// /procedure/async           background call (POST)
/// /jobs                      list (GET), bulk delete (DELETE)
/// /jobs/{id}                 get (GET), delete (DELETE)
/// ```
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/ping", get(handlers::health::ping))
        .nest("/procedure", procedure::router())
        .nest("/jobs", jobs::router())
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
