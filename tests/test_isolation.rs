//! Step isolation tester against a mock backend
//!
//! - Malformed user JSON never reaches the network
//! - Request body shape
//! - Backend-reported errors vs HTTP failures

mod common;

use chainpulse::chain::{NullView, StepForm, StepIsolationTester};
use chainpulse::models::ResponseBody;
use chainpulse::ChainpulseError;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{backend, TEST_STEP};

fn form() -> StepForm {
    StepForm {
        endpoint_id: "12".to_string(),
        payload: r#"{"user": "{{username}}"}"#.to_string(),
        headers: r#"{"X-Trace": "1"}"#.to_string(),
        data_extraction_rules: r#"[{"variable_name": "uid", "source_type": "json_body", "source_identifier": "id"}]"#
            .to_string(),
        mock_context: r#"{"username": "bob"}"#.to_string(),
    }
}

#[tokio::test]
async fn test_malformed_mock_context_sends_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEST_STEP))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let mut tester = StepIsolationTester::new(backend(&server), NullView);
    let mut bad = form();
    bad.mock_context = "{'username': 'bob'}".to_string();

    let result = tester.test_step(&bad).await;

    assert!(matches!(result, Err(ChainpulseError::Validation { ref field, .. }) if field == "mock_context"));
    assert!(tester.mock_context_state().invalid);
}

#[tokio::test]
async fn test_invalid_rules_and_missing_endpoint_send_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEST_STEP))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let mut tester = StepIsolationTester::new(backend(&server), NullView);

    let mut bad = form();
    bad.data_extraction_rules = r#"{"variable_name": "x"}"#.to_string();
    assert!(tester.test_step(&bad).await.is_err());

    let mut bad = form();
    bad.endpoint_id = "  ".to_string();
    assert!(matches!(tester.test_step(&bad).await, Err(ChainpulseError::Validation { .. })));
}

#[tokio::test]
async fn test_request_body_and_result_panels() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEST_STEP))
        .and(body_json(json!({
            "endpoint_id": "12",
            "payload": "{\"user\": \"{{username}}\"}",
            "headers": "{\"X-Trace\": \"1\"}",
            "data_extraction_rules": [
                {"variable_name": "uid", "source_type": "json_body", "source_identifier": "id"}
            ],
            "mock_context": {"username": "bob"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rendered_payload": {"user": "bob"},
            "response": {"status_code": 201, "body": "{\"id\": 5}"},
            "extracted_data": {"uid": 5}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut tester = StepIsolationTester::new(backend(&server), NullView);
    let panels = tester.test_step(&form()).await.unwrap();

    assert_eq!(panels.rendered_payload, "{\n  \"user\": \"bob\"\n}");
    assert_eq!(panels.status_code, Some(201));
    assert_eq!(panels.response_body, ResponseBody::Json(json!({"id": 5})));
    assert_eq!(panels.extracted_data.get("uid"), Some(&json!(5)));
    assert!(!tester.mock_context_state().invalid);
}

#[tokio::test]
async fn test_blank_rules_and_context_default_to_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEST_STEP))
        .and(body_json(json!({
            "endpoint_id": "3",
            "payload": "",
            "headers": "",
            "data_extraction_rules": [],
            "mock_context": {}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": {"status_code": 204}})))
        .expect(1)
        .mount(&server)
        .await;

    let mut tester = StepIsolationTester::new(backend(&server), NullView);
    let form = StepForm { endpoint_id: "3".to_string(), ..StepForm::default() };
    let panels = tester.test_step(&form).await.unwrap();
    assert_eq!(panels.status_code, Some(204));
    assert!(panels.extracted_data.is_empty());
}

#[tokio::test]
async fn test_backend_error_field_is_application_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEST_STEP))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "Endpoint 12 not found"})))
        .mount(&server)
        .await;

    let mut tester = StepIsolationTester::new(backend(&server), NullView);
    match tester.test_step(&form()).await {
        Err(ChainpulseError::Application(message)) => assert_eq!(message, "Endpoint 12 not found"),
        other => panic!("expected application error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_error_reply_with_null_sections_is_application_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEST_STEP))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "Endpoint not found",
            "response": null,
            "extracted_data": null
        })))
        .mount(&server)
        .await;

    let mut tester = StepIsolationTester::new(backend(&server), NullView);
    let error = tester.test_step(&form()).await.unwrap_err();
    assert!(!error.is_transport());
    assert_eq!(error.to_string(), "Endpoint not found");
}

#[tokio::test]
async fn test_http_status_wins_over_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEST_STEP))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
        .mount(&server)
        .await;

    let mut tester = StepIsolationTester::new(backend(&server), NullView);
    let error = tester.test_step(&form()).await.unwrap_err();
    assert!(error.is_transport());
    assert_eq!(error.to_string(), "HTTP 500 Internal Server Error");
}
