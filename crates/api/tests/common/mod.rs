#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use oragate_api::config::ServerConfig;
use oragate_api::jobs::JobRegistry;
use oragate_api::middleware::auth::AuthConfig;
use oragate_api::router::build_app_router;
use oragate_api::state::AppState;
use oragate_core::backend::{
    report, BackendError, InvocationStage, OutValues, ProcedureInvoker, StageSender,
};
use oragate_core::call_builder::CallPlan;
use oragate_core::job::AsyncJob;
use oragate_core::query_log::QueryLog;
use oragate_core::store::{JobStore, QueryLogStore, StoreResult};
use oragate_core::types::Timestamp;
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt;

pub const TEST_TOKEN: &str = "test-token";

// ---------------------------------------------------------------------------
// Scripted backend
// ---------------------------------------------------------------------------

/// In-process backend that answers every call with the same scripted result.
pub struct FakeInvoker {
    result: Result<OutValues, BackendError>,
    delay: Option<Duration>,
    panic_with: Option<&'static str>,
    ping_error: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeInvoker {
    pub fn succeeding(out: Value) -> Self {
        let out = match out {
            Value::Object(map) => map,
            _ => OutValues::new(),
        };
        Self::with_result(Ok(out))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_result(Err(BackendError::execute(message)))
    }

    pub fn panicking(message: &'static str) -> Self {
        Self {
            panic_with: Some(message),
            ..Self::with_result(Ok(OutValues::new()))
        }
    }

    fn with_result(result: Result<OutValues, BackendError>) -> Self {
        Self {
            result,
            delay: None,
            panic_with: None,
            ping_error: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn ping_failing(mut self, message: &str) -> Self {
        self.ping_error = Some(message.to_string());
        self
    }

    /// Call texts received so far.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ProcedureInvoker for FakeInvoker {
    async fn invoke(&self, plan: CallPlan, stages: StageSender) -> Result<OutValues, BackendError> {
        self.calls.lock().await.push(plan.sql.clone());
        report(&stages, InvocationStage::Prepared);
        report(&stages, InvocationStage::Executing);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = self.panic_with {
            panic!("{message}");
        }

        let out = self.result.clone()?;
        report(&stages, InvocationStage::Harvested);
        Ok(out)
    }

    async fn ping(&self) -> Result<(), BackendError> {
        match &self.ping_error {
            Some(message) => Err(BackendError::connect(message.clone())),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Recording store
// ---------------------------------------------------------------------------

/// Store that keeps mirror writes in memory.
///
/// `insert_job` never overwrites an existing row, matching the Postgres
/// store's `ON CONFLICT DO NOTHING`.
#[derive(Default)]
pub struct MemoryStore {
    pub jobs: Mutex<Vec<AsyncJob>>,
    pub logs: Mutex<Vec<QueryLog>>,
    pub insert_delay: Option<Duration>,
}

impl MemoryStore {
    pub fn with_insert_delay(delay: Duration) -> Self {
        Self {
            insert_delay: Some(delay),
            ..Self::default()
        }
    }

    pub async fn job(&self, id: &str) -> Option<AsyncJob> {
        self.jobs.lock().await.iter().find(|j| j.id == id).cloned()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn insert_job(&self, job: &AsyncJob) -> StoreResult<()> {
        if let Some(delay) = self.insert_delay {
            tokio::time::sleep(delay).await;
        }
        let mut jobs = self.jobs.lock().await;
        if !jobs.iter().any(|j| j.id == job.id) {
            jobs.push(job.clone());
        }
        Ok(())
    }

    async fn update_job(&self, job: &AsyncJob) -> StoreResult<()> {
        let mut jobs = self.jobs.lock().await;
        match jobs.iter_mut().find(|j| j.id == job.id) {
            Some(existing) => *existing = job.clone(),
            None => jobs.push(job.clone()),
        }
        Ok(())
    }

    async fn delete_job(&self, id: &str) -> StoreResult<()> {
        self.jobs.lock().await.retain(|j| j.id != id);
        Ok(())
    }

    async fn delete_jobs(&self, ids: &[String]) -> StoreResult<u64> {
        let mut jobs = self.jobs.lock().await;
        let before = jobs.len();
        jobs.retain(|j| !ids.contains(&j.id));
        Ok((before - jobs.len()) as u64)
    }

    async fn load_since(&self, since: Timestamp) -> StoreResult<Vec<AsyncJob>> {
        Ok(self
            .jobs
            .lock()
            .await
            .iter()
            .filter(|j| j.start_time >= since)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl QueryLogStore for MemoryStore {
    async fn save_query_log(&self, log: &QueryLog) -> StoreResult<()> {
        self.logs.lock().await.push(log.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults and auth enabled.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        job_retention_hours: 24,
        job_sweep_interval_secs: 3600,
        auth: AuthConfig {
            token: Some(TEST_TOKEN.to_string()),
            disabled: false,
            allowed_ips: Vec::new(),
        },
    }
}

/// Build the full application router around `invoker`, without a store.
pub fn build_test_app(invoker: Arc<FakeInvoker>) -> Router {
    build_test_app_with(test_config(), invoker, None).0
}

/// Build the full application router and return the registry alongside it.
pub fn build_test_app_with(
    config: ServerConfig,
    invoker: Arc<FakeInvoker>,
    store: Option<Arc<MemoryStore>>,
) -> (Router, Arc<JobRegistry>) {
    let job_store = store.clone().map(|s| s as Arc<dyn JobStore>);
    let query_log = store.map(|s| s as Arc<dyn QueryLogStore>);
    let registry = Arc::new(JobRegistry::new(job_store));

    let state = AppState::new(config.clone(), invoker, Arc::clone(&registry), query_log);
    (build_app_router(state, &config), registry)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

fn authorized(method: Method, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {TEST_TOKEN}"))
}

/// Authenticated GET.
pub async fn get(app: Router, uri: &str) -> Response {
    let req = authorized(Method::GET, uri).body(Body::empty()).unwrap();
    app.oneshot(req).await.unwrap()
}

/// Authenticated DELETE.
pub async fn delete(app: Router, uri: &str) -> Response {
    let req = authorized(Method::DELETE, uri).body(Body::empty()).unwrap();
    app.oneshot(req).await.unwrap()
}

/// Authenticated POST with a JSON body.
pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    post_raw(app, uri, body.to_string()).await
}

/// Authenticated POST with an arbitrary body.
pub async fn post_raw(app: Router, uri: &str, body: String) -> Response {
    let req = authorized(Method::POST, uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(req).await.unwrap()
}

/// GET with an explicit authorization header and caller address.
pub async fn get_as(
    app: Router,
    uri: &str,
    authorization: Option<&str>,
    peer: Option<SocketAddr>,
) -> Response {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    let mut req = builder.body(Body::empty()).unwrap();
    if let Some(addr) = peer {
        req.extensions_mut().insert(ConnectInfo(addr));
    }
    app.oneshot(req).await.unwrap()
}

/// Poll `GET /jobs/{id}` until the job is terminal.
pub async fn wait_for_job(app: &Router, job_id: &str) -> Value {
    for _ in 0..200 {
        let response = get(app.clone(), &format!("/jobs/{job_id}")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let job = body_json(response).await;
        if job["status"] == "completed" || job["status"] == "failed" {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} did not finish");
}
