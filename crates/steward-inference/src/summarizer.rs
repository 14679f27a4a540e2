//! Email thread summarizer.
//!
//! Same two-part reply protocol as chat, but the payload carries a summary
//! and lists of candidate tasks and meetings. Candidates are presented for
//! one-shot acceptance; nothing is written here.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use steward_core::datetime::canonical_option;
use steward_core::{
    normalize_optional, DateTarget, GenerationBackend, GenerationRequest, Message, Priority, Result,
};

use crate::config::CompletionSettings;
use crate::parser::{identities, text_field};
use crate::prompts::{summary_system_prompt, summary_user_prompt};
use crate::response::{first_json_value, split_on_sentinel};
use crate::thinking::strip_thinking;

/// Error reported alongside the summary when the payload is unusable.
pub const PARSE_FAILURE: &str = "Failed to parse structured data";

/// A task suggested by a thread summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCandidate {
    pub title: String,
    pub priority: Priority,
    #[serde(with = "canonical_option", default)]
    pub due_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(rename = "extracted_from", default)]
    pub extracted_from: String,
}

/// A meeting suggested by a thread summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingCandidate {
    pub title: String,
    #[serde(with = "canonical_option", default)]
    pub time: Option<NaiveDateTime>,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub agenda: String,
    #[serde(rename = "extracted_from", default)]
    pub extracted_from: String,
}

/// Parsed thread summary.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ThreadSummary {
    pub summary: String,
    pub tasks: Vec<TaskCandidate>,
    pub meetings: Vec<MeetingCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Parse a summary completion relative to `now`.
///
/// A usable payload `summary` replaces the prose prefix. A malformed payload
/// keeps the prefix and sets `error`.
pub fn parse_summary_response(raw: &str, now: NaiveDateTime) -> ThreadSummary {
    let answer = strip_thinking(raw);
    let split = split_on_sentinel(&answer);

    let Some(segment) = split.payload else {
        return ThreadSummary {
            summary: split.reply,
            ..Default::default()
        };
    };

    let payload = match first_json_value(segment) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            warn!(
                subsystem = "inference",
                component = "summarizer",
                "Summary payload is not an object"
            );
            return failed(split.reply);
        }
        Err(e) => {
            warn!(
                subsystem = "inference",
                component = "summarizer",
                error = %e,
                "Summary payload is not valid JSON"
            );
            return failed(split.reply);
        }
    };

    let summary = text_field(&payload, &["summary"])
        .map(|s| s.trim().to_string())
        .unwrap_or(split.reply);

    ThreadSummary {
        summary,
        tasks: entries(&payload, "tasks")
            .filter_map(|fields| task_candidate(fields, now))
            .collect(),
        meetings: entries(&payload, "meetings")
            .filter_map(|fields| meeting_candidate(fields, now))
            .collect(),
        error: None,
    }
}

fn failed(summary: String) -> ThreadSummary {
    ThreadSummary {
        summary,
        error: Some(PARSE_FAILURE.to_string()),
        ..Default::default()
    }
}

fn entries<'a>(
    payload: &'a Map<String, Value>,
    key: &str,
) -> impl Iterator<Item = &'a Map<String, Value>> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn title(fields: &Map<String, Value>) -> Option<String> {
    text_field(fields, &["title"]).map(|t| t.trim().to_string())
}

fn task_candidate(fields: &Map<String, Value>, now: NaiveDateTime) -> Option<TaskCandidate> {
    Some(TaskCandidate {
        title: title(fields)?,
        priority: Priority::coerce(fields.get("priority").and_then(Value::as_str)),
        due_date: normalize_optional(
            text_field(fields, &["dueDate", "due_date"]),
            now,
            DateTarget::Task,
        ),
        participants: identities(fields.get("participants")),
        extracted_from: text_field(fields, &["extracted_from"]).unwrap_or_default().to_string(),
    })
}

fn meeting_candidate(fields: &Map<String, Value>, now: NaiveDateTime) -> Option<MeetingCandidate> {
    Some(MeetingCandidate {
        title: title(fields)?,
        time: normalize_optional(text_field(fields, &["time"]), now, DateTarget::Meeting),
        participants: identities(fields.get("participants")),
        agenda: text_field(fields, &["agenda"]).unwrap_or_default().trim().to_string(),
        extracted_from: text_field(fields, &["extracted_from"]).unwrap_or_default().to_string(),
    })
}

/// Sends threads to the completion service and parses the summary.
#[derive(Clone)]
pub struct ThreadSummarizer {
    backend: Arc<dyn GenerationBackend>,
    settings: CompletionSettings,
}

impl ThreadSummarizer {
    pub fn new(backend: Arc<dyn GenerationBackend>, settings: CompletionSettings) -> Self {
        Self { backend, settings }
    }

    /// Summarize `messages` (oldest first) under `subject`.
    pub async fn summarize(
        &self,
        subject: &str,
        messages: &[Message],
        now: NaiveDateTime,
    ) -> Result<ThreadSummary> {
        let start = Instant::now();
        let request = GenerationRequest {
            system: summary_system_prompt(now),
            prompt: summary_user_prompt(subject, messages),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let raw = self.backend.generate(&request).await.map_err(|e| {
            error!(
                subsystem = "inference",
                component = "summarizer",
                op = "summarize",
                model = self.backend.model_name(),
                error = %e,
                "Completion call failed"
            );
            e
        })?;

        let summary = parse_summary_response(&raw, now);
        info!(
            subsystem = "inference",
            component = "summarizer",
            op = "summarize",
            model = self.backend.model_name(),
            message_count = messages.len(),
            task_count = summary.tasks.len(),
            meeting_count = summary.meetings.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Thread summarized"
        );
        Ok(summary)
    }
}
