//! `message/stream` over real SSE: progressive word-by-word delivery, and
//! the completion-await fallback when `queryProgressSignals` never
//! populates (the "query-name regression" scenario).

mod common;

use a2a_gateway::domain::{now_iso8601_millis, ProgressSignal};
use axum_test::TestServer;
use serde_json::{json, Value};

use common::{test_app, Script};

fn signal(status: &str, text: &str) -> ProgressSignal {
    ProgressSignal {
        task_id: "unused".to_string(),
        status: status.to_string(),
        progress: 1.0,
        result: Some(json!({"text": text})),
        error: None,
        timestamp: now_iso8601_millis(),
    }
}

/// Split an SSE body into its `data: ...` payloads, parsed as JSON.
fn parse_sse_events(body: &str) -> Vec<Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).expect("each SSE data line is a JSON event"))
        .collect()
}

#[tokio::test]
async fn progressive_signals_stream_word_by_word_then_terminate() {
    let script = Script::Progressive(vec![
        signal("working", "Echo: "),
        signal("working", "Echo: Hello"),
        signal("completed", "Echo: Hello"),
    ]);
    let server = TestServer::new(test_app(script)).unwrap();

    let response = server
        .post("/echo-agent")
        .json(&json!({"jsonrpc": "2.0", "method": "message/stream", "params": {"message": "hi"}, "id": 1}))
        .await;

    response.assert_status_ok();
    let events = parse_sse_events(&response.text());

    // Exactly one terminal status event must appear, carrying `completed`.
    let terminal: Vec<&Value> = events.iter().filter(|e| e["final"] == json!(true)).collect();
    assert_eq!(terminal.len(), 1, "exactly one terminal status event per stream");
    assert_eq!(terminal[0]["status"]["state"], "completed");

    let artifact_texts: Vec<&str> = events
        .iter()
        .filter(|e| e["kind"] == "artifact-update")
        .map(|e| e["artifact"]["parts"][0]["text"].as_str().unwrap())
        .collect();
    assert!(artifact_texts.contains(&"Echo: "));
}

#[tokio::test]
async fn completion_await_fallback_still_emits_a_terminal_event_when_signals_never_populate() {
    let script = Script::CompletionOnly(json!({"text": "done via fallback"}));
    let server = TestServer::new(test_app(script)).unwrap();

    let response = server
        .post("/echo-agent")
        .json(&json!({"jsonrpc": "2.0", "method": "message/stream", "params": {"message": "hi"}, "id": 1}))
        .await;

    response.assert_status_ok();
    let events = parse_sse_events(&response.text());

    let terminal_count = events.iter().filter(|e| e["final"] == json!(true)).count();
    assert_eq!(terminal_count, 1);
    assert_eq!(events.last().unwrap()["kind"], "artifact-update");
    assert_eq!(events.last().unwrap()["artifact"]["parts"][0]["text"], "done via fallback");
}

#[tokio::test]
async fn workflow_start_failure_emits_a_single_failed_status_and_no_artifact() {
    let server = TestServer::new(test_app(Script::StartFails)).unwrap();

    let response = server
        .post("/echo-agent")
        .json(&json!({"jsonrpc": "2.0", "method": "message/stream", "params": {"message": "hi"}, "id": 1}))
        .await;

    response.assert_status_ok();
    let events = parse_sse_events(&response.text());

    assert_eq!(events.len(), 1, "a start failure closes the stream after exactly one event");
    assert_eq!(events[0]["status"]["state"], "failed");
    assert_eq!(events[0]["final"], json!(true));
}
