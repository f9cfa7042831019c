//! Chain debugger against a mock backend
//!
//! - Cursor and context progression over successful steps
//! - Failed steps leave the session where it was
//! - Transport failures and malformed replies
//! - Reset

mod common;

use chainpulse::chain::{ChainDebugger, ChainDefinition, FailureKind, StepOutcome, StepStatus};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{backend, mount_step, step_reply, EXECUTE_STEP};

fn chain(ids: &[&str]) -> ChainDefinition {
    ChainDefinition::from_step_ids(ids.iter().copied()).unwrap()
}

fn context_json(debugger: &ChainDebugger<chainpulse::HttpBackend, chainpulse::chain::NullView>) -> Value {
    serde_json::to_value(debugger.session().context()).unwrap()
}

// ============================================================================
// End-to-end
// ============================================================================

#[tokio::test]
async fn test_failed_step_can_be_retried() {
    let server = MockServer::start().await;

    mount_step(&server, "1", step_reply(json!({"token": "abc"}), json!({"ok": true}))).await;

    // Step 2 must see the token; the first attempt is rejected by the server
    Mock::given(method("POST"))
        .and(path(EXECUTE_STEP))
        .and(body_partial_json(json!({"step_id": "2", "context": {"token": "abc"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "bad token"})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(EXECUTE_STEP))
        .and(body_partial_json(json!({"step_id": "2", "context": {"token": "abc"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(step_reply(json!({"user_id": 7}), json!({"id": 7}))))
        .expect(1)
        .mount(&server)
        .await;

    let mut debugger = ChainDebugger::headless(backend(&server), chain(&["1", "2", "3"]));

    assert!(debugger.run_next_step().await.is_success());
    assert_eq!(debugger.session().cursor(), 1);

    match debugger.run_next_step().await {
        StepOutcome::Failed { index, failure } => {
            assert_eq!(index, 1);
            assert_eq!(failure.kind, FailureKind::Application);
            assert_eq!(failure.message, "bad token");
        }
        other => panic!("expected step 2 to fail, got {:?}", other),
    }
    assert_eq!(debugger.session().cursor(), 1);
    assert_eq!(debugger.session().status(1), Some(StepStatus::Failed));
    assert_eq!(context_json(&debugger), json!({"token": "abc"}));

    // Same step again, now accepted
    let StepOutcome::Succeeded(record) = debugger.run_next_step().await else {
        panic!("expected retry of step 2 to succeed")
    };
    assert_eq!(record.index, 1);
    assert_eq!(record.status_code, Some(200));
    assert_eq!(debugger.session().cursor(), 2);
    assert_eq!(debugger.session().status(1), Some(StepStatus::Succeeded));
    assert_eq!(context_json(&debugger), json!({"token": "abc", "user_id": 7}));
}

#[tokio::test]
async fn test_context_is_merged_in_call_order() {
    let server = MockServer::start().await;
    mount_step(&server, "a", step_reply(json!({"x": 1, "y": 1}), json!({}))).await;
    mount_step(&server, "b", step_reply(json!({"y": 2}), json!({}))).await;
    mount_step(&server, "c", step_reply(json!({"z": 3}), json!("plain text body"))).await;

    let mut debugger = ChainDebugger::headless(backend(&server), chain(&["a", "b", "c"]));
    let outcomes = debugger.run_to_end().await;

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(StepOutcome::is_success));
    assert_eq!(debugger.session().cursor(), 3);
    assert!(debugger.session().is_exhausted());
    assert_eq!(context_json(&debugger), json!({"x": 1, "y": 2, "z": 3}));

    // Each request carried the context accumulated before it
    let requests = server.received_requests().await.unwrap();
    let contexts: Vec<Value> = requests
        .iter()
        .map(|r| serde_json::from_slice::<Value>(&r.body).unwrap()["context"].clone())
        .collect();
    assert_eq!(contexts, vec![json!({}), json!({"x": 1, "y": 1}), json!({"x": 1, "y": 2})]);

    // Nothing left to run: no further request
    assert_eq!(debugger.run_next_step().await, StepOutcome::Exhausted);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_http_error_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(EXECUTE_STEP))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let mut debugger = ChainDebugger::headless(backend(&server), chain(&["1"]));
    let StepOutcome::Failed { failure, .. } = debugger.run_next_step().await else {
        panic!("expected failure")
    };

    assert_eq!(failure.kind, FailureKind::Transport);
    assert!(failure.message.starts_with("An unexpected error occurred"));
    assert!(failure.message.contains("502"));
    assert_eq!(debugger.session().cursor(), 0);
}

#[tokio::test]
async fn test_http_error_with_json_error_body_is_application_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(EXECUTE_STEP))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Step 9 not found"})))
        .mount(&server)
        .await;

    let mut debugger = ChainDebugger::headless(backend(&server), chain(&["9"]));
    let StepOutcome::Failed { failure, .. } = debugger.run_next_step().await else {
        panic!("expected failure")
    };

    assert_eq!(failure.kind, FailureKind::Application);
    assert_eq!(failure.message, "Step 9 not found");
}

#[tokio::test]
async fn test_error_reply_with_null_sections_keeps_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(EXECUTE_STEP))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "bad token",
            "request": null,
            "response": null
        })))
        .mount(&server)
        .await;

    let mut debugger = ChainDebugger::headless(backend(&server), chain(&["1"]));
    let StepOutcome::Failed { failure, .. } = debugger.run_next_step().await else {
        panic!("expected failure")
    };

    assert_eq!(failure.kind, FailureKind::Application);
    assert_eq!(failure.message, "bad token");
    assert_eq!(debugger.session().cursor(), 0);
}

#[tokio::test]
async fn test_success_reply_with_null_sections() {
    let server = MockServer::start().await;
    mount_step(&server, "1", json!({"new_context_variables": {"k": 1}, "request": null, "response": null})).await;

    let mut debugger = ChainDebugger::headless(backend(&server), chain(&["1"]));
    let StepOutcome::Succeeded(record) = debugger.run_next_step().await else {
        panic!("expected success")
    };

    assert_eq!(record.status_code, None);
    assert_eq!(record.request_payload, Value::Null);
    assert_eq!(context_json(&debugger), json!({"k": 1}));
}

#[tokio::test]
async fn test_non_json_success_reply_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(EXECUTE_STEP))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    let mut debugger = ChainDebugger::headless(backend(&server), chain(&["1"]));
    let StepOutcome::Failed { failure, .. } = debugger.run_next_step().await else {
        panic!("expected failure")
    };
    assert_eq!(failure.kind, FailureKind::Transport);
    assert!(debugger.session().context().is_empty());
}

// ============================================================================
// Reset
// ============================================================================

#[tokio::test]
async fn test_reset_clears_progress_without_network() {
    let server = MockServer::start().await;
    mount_step(&server, "1", step_reply(json!({"token": "abc"}), json!({}))).await;

    let mut debugger = ChainDebugger::headless(backend(&server), chain(&["1", "2"]));
    debugger.run_next_step().await;
    let before = server.received_requests().await.unwrap().len();

    debugger.reset_session();

    assert_eq!(debugger.session().cursor(), 0);
    assert!(debugger.session().context().is_empty());
    assert!(debugger.session().statuses().iter().all(|s| *s == StepStatus::Pending));
    assert_eq!(server.received_requests().await.unwrap().len(), before);
}
