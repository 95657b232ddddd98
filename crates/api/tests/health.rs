//! Integration tests for the health and ping endpoints and general HTTP behaviour.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, get, FakeInvoker};
use serde_json::json;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Test: GET /health returns 200 without credentials
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_needs_no_token() {
    let app = common::build_test_app(Arc::new(FakeInvoker::succeeding(json!({}))));
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

// ---------------------------------------------------------------------------
// Test: x-request-id header is present in response
// ---------------------------------------------------------------------------

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let app = common::build_test_app(Arc::new(FakeInvoker::succeeding(json!({}))));
    let response = get(app, "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

#[tokio::test]
async fn provided_request_id_is_propagated() {
    let app = common::build_test_app(Arc::new(FakeInvoker::succeeding(json!({}))));
    let req = Request::builder()
        .uri("/health")
        .header("x-request-id", "caller-supplied-id")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "caller-supplied-id");
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = common::build_test_app(Arc::new(FakeInvoker::succeeding(json!({}))));
    let response = get(app, "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: CORS preflight
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cors_preflight_is_answered() {
    let app = common::build_test_app(Arc::new(FakeInvoker::succeeding(json!({}))));
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/procedure")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:5173"
    );
}

// ---------------------------------------------------------------------------
// Test: GET /ping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ping_reports_backend_ok() {
    let app = common::build_test_app(Arc::new(FakeInvoker::succeeding(json!({}))));
    let response = get(app, "/ping").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn ping_reports_backend_failure() {
    let invoker = FakeInvoker::succeeding(json!({})).ping_failing("ORA-12541: TNS:no listener");
    let app = common::build_test_app(Arc::new(invoker));
    let response = get(app, "/ping").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["status"], "error");
    assert_eq!(json["message"], "ORA-12541: TNS:no listener");
}
