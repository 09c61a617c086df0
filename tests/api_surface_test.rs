//! The HTTP surface beyond the A2A protocol itself: health, metrics, and
//! the error taxonomy.

mod common;

use axum_test::TestServer;
use serde_json::Value;

use common::{test_app, Script};

#[tokio::test]
async fn health_reports_connectivity_without_a_real_redis_or_workflow_engine() {
    let server = TestServer::new(test_app(Script::Progressive(vec![]))).unwrap();
    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    // The fake workflow client and in-memory store are both reachable by
    // construction; only the registry (pointed at a closed port) is not.
    assert_eq!(body["connectivity"]["workflowEngine"], true);
    assert_eq!(body["connectivity"]["redis"], true);
    assert_eq!(body["connectivity"]["registry"], false);
}

#[tokio::test]
async fn errors_endpoint_serves_the_full_taxonomy() {
    let server = TestServer::new(test_app(Script::Progressive(vec![]))).unwrap();
    let response = server.get("/errors").await;

    response.assert_status_ok();
    let body: Value = response.json();
    let entries = body.as_array().unwrap();
    assert!(entries.iter().any(|e| e["code"] == -32000));
    assert!(entries.iter().any(|e| e["code"] == -32700));
}

#[tokio::test]
async fn metrics_endpoint_serves_prometheus_text_after_traffic() {
    let server = TestServer::new(test_app(Script::Progressive(vec![]))).unwrap();
    let _ = server.get("/health").await;

    let response = server.get("/metrics").await;
    response.assert_status_ok();
    let body = response.text();
    assert!(body.contains("a2a_gateway_requests_in_flight"));
}
