//! Integration tests for `AnthropicClient::complete` against a `wiremock`
//! stand-in for the Messages API.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ytintel_analysis::{AnthropicClient, ReasoningService, SynthesisError};

fn test_client(base_url: &str) -> AnthropicClient {
    AnthropicClient::new("test-key", base_url, "test-model", 5)
        .expect("failed to build test AnthropicClient")
}

#[tokio::test]
async fn complete_sends_headers_and_joins_text_blocks() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "system": "be terse",
            "messages": [{ "role": "user", "content": "hello" }],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "type": "message",
            "content": [
                { "type": "text", "text": "{\"recommendations\":" },
                { "type": "tool_use", "id": "t1", "name": "x", "input": {} },
                { "type": "text", "text": "[]}" },
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = test_client(&server.uri())
        .complete("be terse", "hello")
        .await
        .expect("complete failed");

    assert_eq!(text, "{\"recommendations\":[]}");
}

#[tokio::test]
async fn base_url_with_path_prefix_is_preserved() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/proxy/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "type": "text", "text": "ok" }],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&format!("{}/proxy/", server.uri()));
    assert_eq!(client.complete("s", "p").await.unwrap(), "ok");
}

#[tokio::test]
async fn error_status_carries_api_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_json(json!({
            "type": "error",
            "error": { "type": "overloaded_error", "message": "Overloaded" },
        })))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .complete("s", "p")
        .await
        .unwrap_err();

    match err {
        SynthesisError::UnexpectedStatus { status, message } => {
            assert_eq!(status, 529);
            assert_eq!(message, "Overloaded");
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn response_without_text_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": [] })))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .complete("s", "p")
        .await
        .unwrap_err();
    assert!(matches!(err, SynthesisError::Malformed(_)));
}

#[tokio::test]
async fn non_json_success_body_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .complete("s", "p")
        .await
        .unwrap_err();
    assert!(matches!(err, SynthesisError::Malformed(_)));
}
