use std::sync::Arc;

use oragate_core::backend::ProcedureInvoker;
use oragate_core::store::QueryLogStore;

use crate::config::ServerConfig;
use crate::jobs::{JobRegistry, JobRunner};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (read by the auth middleware).
    pub config: Arc<ServerConfig>,
    /// Backend executor shared by the sync and async paths.
    pub invoker: Arc<dyn ProcedureInvoker>,
    /// Authoritative registry of async jobs.
    pub jobs: Arc<JobRegistry>,
    /// Spawns background invocations against `jobs`.
    pub runner: JobRunner,
    /// Audit sink for synchronous calls. `None` when running without a
    /// persistent store.
    pub query_log: Option<Arc<dyn QueryLogStore>>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        invoker: Arc<dyn ProcedureInvoker>,
        jobs: Arc<JobRegistry>,
        query_log: Option<Arc<dyn QueryLogStore>>,
    ) -> Self {
        let runner = JobRunner::new(Arc::clone(&jobs), Arc::clone(&invoker));
        Self {
            config: Arc::new(config),
            invoker,
            jobs,
            runner,
            query_log,
        }
    }
}
