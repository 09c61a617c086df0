//! Happy-path task lifecycle over the real HTTP surface: submit, poll,
//! cancel, and the unknown-agent/malformed-envelope failure modes.

mod common;

use axum_test::TestServer;
use serde_json::{json, Value};

use common::{test_app, Script};

fn envelope(method: &str, params: Value) -> Value {
    json!({"jsonrpc": "2.0", "method": method, "params": params, "id": 1})
}

#[tokio::test]
async fn message_send_returns_a_working_task() {
    let server = TestServer::new(test_app(Script::StartFails)).unwrap();
    let response = server
        .post("/echo-agent")
        .json(&envelope("message/send", json!({"message": "hi"})))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body.get("error").is_some(), "workflow start failure must surface as a JSON-RPC error");
    assert_eq!(body["error"]["code"], -32002);
}

#[tokio::test]
async fn message_send_then_tasks_get_round_trips() {
    let server = TestServer::new(test_app(Script::Progressive(vec![]))).unwrap();

    let send = server
        .post("/echo-agent")
        .json(&envelope("message/send", json!({"message": "hi"})))
        .await;
    send.assert_status_ok();
    let send_body: Value = send.json();
    let task = &send_body["result"];
    assert_eq!(task["status"]["state"], "working");
    let task_id = task["id"].as_str().unwrap().to_string();

    let get = server
        .post("/echo-agent")
        .json(&envelope("tasks/get", json!({"id": task_id})))
        .await;
    get.assert_status_ok();
    let get_body: Value = get.json();
    assert_eq!(get_body["result"]["id"], task_id);
}

#[tokio::test]
async fn tasks_cancel_is_idempotent_on_a_canceled_task() {
    let server = TestServer::new(test_app(Script::Progressive(vec![]))).unwrap();

    let send = server
        .post("/echo-agent")
        .json(&envelope("message/send", json!({"message": "hi"})))
        .await;
    let task_id = send.json::<Value>()["result"]["id"].as_str().unwrap().to_string();

    let first = server
        .post("/echo-agent")
        .json(&envelope("tasks/cancel", json!({"id": task_id})))
        .await;
    first.assert_status_ok();
    assert_eq!(first.json::<Value>()["result"]["status"], "canceled");

    let second = server
        .post("/echo-agent")
        .json(&envelope("tasks/cancel", json!({"id": task_id})))
        .await;
    second.assert_status_ok();
    assert_eq!(second.json::<Value>()["result"]["status"], "canceled");

    let get = server
        .post("/echo-agent")
        .json(&envelope("tasks/get", json!({"id": task_id})))
        .await;
    assert_eq!(get.json::<Value>()["result"]["status"]["state"], "canceled");
}

#[tokio::test]
async fn unknown_agent_is_rejected_before_any_task_is_created() {
    let server = TestServer::new(test_app(Script::Progressive(vec![]))).unwrap();
    let response = server
        .post("/nonexistent-agent")
        .json(&envelope("message/send", json!({"message": "hi"})))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], -32020);
}

#[tokio::test]
async fn malformed_json_body_yields_a_parse_error() {
    let server = TestServer::new(test_app(Script::Progressive(vec![]))).unwrap();
    let response = server.post("/echo-agent").text("not json at all").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], -32700);
}

#[tokio::test]
async fn wrong_jsonrpc_version_is_an_invalid_request() {
    let server = TestServer::new(test_app(Script::Progressive(vec![]))).unwrap();
    let response = server
        .post("/echo-agent")
        .json(&json!({"jsonrpc": "1.0", "method": "message/send", "params": {}, "id": 1}))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["error"]["code"], -32600);
}

#[tokio::test]
async fn legacy_method_names_dispatch_through_the_primary_endpoint() {
    let server = TestServer::new(test_app(Script::Progressive(vec![]))).unwrap();
    let response = server
        .post("/echo-agent")
        .json(&envelope("sendTask", json!({"message": "hi"})))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["result"]["status"]["state"], "working");
}

#[tokio::test]
async fn legacy_a2a_endpoint_carries_agent_id_in_params_and_sets_deprecation_headers() {
    let server = TestServer::new(test_app(Script::Progressive(vec![]))).unwrap();
    let response = server
        .post("/a2a")
        .json(&envelope("message/send", json!({"message": "hi", "agentId": "echo-agent"})))
        .await;

    response.assert_status_ok();
    response.assert_header("deprecation", "true");
    response.assert_header("sunset", "2026-12-31");
}

#[tokio::test]
async fn metadata_lookup_finds_tasks_by_indexed_metadata() {
    let server = TestServer::new(test_app(Script::Progressive(vec![]))).unwrap();

    let send = server
        .post("/echo-agent")
        .json(&envelope(
            "message/send",
            json!({"message": "hi", "metadata": {"project": "mx"}}),
        ))
        .await;
    let task_id = send.json::<Value>()["result"]["id"].as_str().unwrap().to_string();

    let lookup = server
        .post("/echo-agent")
        .json(&envelope(
            "x-a2a.getTasksByMetadata",
            json!({"metadataKey": "project", "metadataValue": "mx"}),
        ))
        .await;
    lookup.assert_status_ok();
    let ids = lookup.json::<Value>()["result"]["taskIds"].as_array().unwrap().clone();
    assert!(ids.iter().any(|v| v.as_str() == Some(task_id.as_str())));
}
