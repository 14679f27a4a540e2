//! Chat extraction and thread summaries end to end over a mock Messages API.

#![cfg(feature = "anthropic")]

use std::sync::Arc;

use chrono::{NaiveDateTime, TimeZone, Utc};
use serde_json::json;
use steward_core::{format_canonical, parse_canonical, Message, Priority, ProposedAction};
use steward_inference::anthropic::{AnthropicBackend, AnthropicConfig};
use steward_inference::{CompletionSettings, IntentExtractor, ThreadSummarizer};
use uuid::Uuid;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn now() -> NaiveDateTime {
    parse_canonical("2025-02-01T09:00").unwrap()
}

fn text_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn"
    }))
}

async fn backend(server: &MockServer) -> Arc<AnthropicBackend> {
    Arc::new(
        AnthropicBackend::new(AnthropicConfig {
            base_url: server.uri(),
            api_key: "sk-ant-test".to_string(),
            ..AnthropicConfig::default()
        })
        .unwrap(),
    )
}

#[tokio::test]
async fn test_meeting_proposal_extracted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(body_string_contains("Today: 2025-02-01T09:00"))
        .respond_with(text_reply(
            "Sure, I'll set that up.\n__JSON_DATA__\n{\"action\":\"create_meeting\",\"meeting\":{\"title\":\"Team sync\",\"time\":\"2025-02-03T15:00\",\"participants\":[\"b@x.io\",\"c@x.io\"],\"agenda\":\"Weekly sync\"}}",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let extractor = IntentExtractor::new(backend(&server).await, CompletionSettings::default());
    let parsed = extractor
        .extract("Schedule a team sync with b@x.io and c@x.io Monday at 3pm", "a@x.io", now())
        .await
        .unwrap();

    assert_eq!(parsed.reply, "Sure, I'll set that up.");
    match parsed.action {
        Some(ProposedAction::CreateMeeting { meeting }) => {
            assert_eq!(format_canonical(&meeting.time), "2025-02-03T15:00");
            assert_eq!(meeting.participants, vec!["b@x.io", "c@x.io"]);
        }
        other => panic!("expected meeting, got {:?}", other),
    }
}

#[tokio::test]
async fn test_plain_reply_has_no_action() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(text_reply("Hello! How can I help?"))
        .mount(&server)
        .await;

    let extractor = IntentExtractor::new(backend(&server).await, CompletionSettings::default());
    let parsed = extractor.extract("hi", "a@x.io", now()).await.unwrap();
    assert_eq!(parsed.reply, "Hello! How can I help?");
    assert!(parsed.action.is_none());
}

#[tokio::test]
async fn test_invalid_due_date_drops_action_keeps_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(text_reply(
            "Added.\n__JSON_DATA__\n{\"action\":\"create_task\",\"task\":{\"title\":\"Pay rent\",\"priority\":\"High\",\"dueDate\":\"whenever\"}}",
        ))
        .mount(&server)
        .await;

    let extractor = IntentExtractor::new(backend(&server).await, CompletionSettings::default());
    let parsed = extractor.extract("pay rent", "a@x.io", now()).await.unwrap();
    assert_eq!(parsed.reply, "Added.");
    assert!(parsed.action.is_none());
}

#[tokio::test]
async fn test_summary_over_thread() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(body_string_contains("Subject: Launch"))
        .respond_with(text_reply(
            "Launch prep.\n__JSON_DATA__\n{\"summary\":\"Docs need review before Friday.\",\"tasks\":[{\"title\":\"Review docs\",\"priority\":\"high\",\"dueDate\":\"2025-02-06T17:00\",\"extracted_from\":\"review the docs\"}],\"meetings\":[]}",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let thread_id = Uuid::now_v7();
    let messages = vec![Message {
        id: Uuid::now_v7(),
        thread_id,
        sender: "a@x.io".to_string(),
        text: "Please review the docs by Thursday.".to_string(),
        sent_at: Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap(),
    }];

    let summarizer = ThreadSummarizer::new(backend(&server).await, CompletionSettings::default());
    let summary = summarizer.summarize("Launch", &messages, now()).await.unwrap();
    assert_eq!(summary.summary, "Docs need review before Friday.");
    assert_eq!(summary.tasks.len(), 1);
    assert_eq!(summary.tasks[0].priority, Priority::High);
    assert!(summary.error.is_none());
}

#[tokio::test]
async fn test_remote_failure_surfaces_as_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let extractor = IntentExtractor::new(backend(&server).await, CompletionSettings::default());
    assert!(extractor.extract("hi", "a@x.io", now()).await.is_err());
}
