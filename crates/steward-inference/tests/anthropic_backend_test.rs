//! Anthropic backend against a local mock server.

#![cfg(feature = "anthropic")]

use serde_json::json;
use steward_core::{Error, GenerationBackend, GenerationRequest};
use steward_inference::anthropic::{AnthropicBackend, AnthropicConfig};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> AnthropicBackend {
    AnthropicBackend::new(AnthropicConfig {
        base_url: server.uri(),
        api_key: "sk-ant-test".to_string(),
        model: "claude-3-haiku-20240307".to_string(),
        timeout_seconds: 5,
    })
    .expect("backend")
}

fn request() -> GenerationRequest {
    GenerationRequest {
        system: "You are a personal assistant.".to_string(),
        prompt: "User ID: a@x.io\nMessage: hi\nToday: 2025-02-01T09:00".to_string(),
        max_tokens: 1024,
        temperature: 0.7,
    }
}

#[tokio::test]
async fn test_generate_sends_headers_and_joins_text_blocks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "sk-ant-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-3-haiku-20240307",
            "max_tokens": 1024,
            "system": "You are a personal assistant.",
            "messages": [{"role": "user"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "model": "claude-3-haiku-20240307",
            "content": [
                {"type": "text", "text": "Hello"},
                {"type": "text", "text": " there"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 2}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = backend(&server).generate(&request()).await.unwrap();
    assert_eq!(text, "Hello there");
}

#[tokio::test]
async fn test_unauthorized_is_config_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "type": "error",
            "error": {"type": "authentication_error", "message": "invalid x-api-key"}
        })))
        .mount(&server)
        .await;

    let err = backend(&server).generate(&request()).await.unwrap_err();
    assert!(matches!(err, Error::Config(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_overloaded_is_inference_error_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_json(json!({
            "type": "error",
            "error": {"type": "overloaded_error", "message": "Overloaded"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = backend(&server).generate(&request()).await.unwrap_err();
    assert!(matches!(err, Error::Inference(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unparseable_error_body_still_maps_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let err = backend(&server).generate(&request()).await.unwrap_err();
    assert!(matches!(err, Error::Inference(_)));
}

#[tokio::test]
async fn test_reply_without_text_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
        .mount(&server)
        .await;

    let err = backend(&server).generate(&request()).await.unwrap_err();
    assert!(matches!(err, Error::Inference(_)));
}

#[test]
fn test_missing_key_rejected() {
    let result = AnthropicBackend::new(AnthropicConfig {
        api_key: String::new(),
        ..AnthropicConfig::default()
    });
    assert!(matches!(result, Err(Error::Config(_))));
}
