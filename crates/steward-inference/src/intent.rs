//! Intent extractor: one chat turn through the completion service.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDateTime;
use tracing::{error, info};

use steward_core::{GenerationBackend, GenerationRequest, Result};

use crate::config::CompletionSettings;
use crate::parser::{parse_chat_response, ParsedReply};
use crate::prompts::{chat_system_prompt, chat_user_prompt};

/// Sends user messages to the completion service and parses the reply.
#[derive(Clone)]
pub struct IntentExtractor {
    backend: Arc<dyn GenerationBackend>,
    settings: CompletionSettings,
}

impl IntentExtractor {
    pub fn new(backend: Arc<dyn GenerationBackend>, settings: CompletionSettings) -> Self {
        Self { backend, settings }
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Build the completion request for a message.
    pub fn request(&self, message: &str, user_id: &str, now: NaiveDateTime) -> GenerationRequest {
        GenerationRequest {
            system: chat_system_prompt(now),
            prompt: chat_user_prompt(user_id, message, now),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        }
    }

    /// Run one chat turn. Remote failures are returned as errors without retry;
    /// payload problems only drop the action.
    pub async fn extract(
        &self,
        message: &str,
        user_id: &str,
        now: NaiveDateTime,
    ) -> Result<ParsedReply> {
        let start = Instant::now();
        let request = self.request(message, user_id, now);

        let raw = match self.backend.generate(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(
                    subsystem = "inference",
                    component = "intent",
                    op = "extract",
                    model = self.backend.model_name(),
                    error = %e,
                    "Completion call failed"
                );
                return Err(e);
            }
        };

        let parsed = parse_chat_response(&raw, now);
        info!(
            subsystem = "inference",
            component = "intent",
            op = "extract",
            model = self.backend.model_name(),
            response_len = raw.len(),
            action_kind = parsed.action.as_ref().map(|a| a.kind().as_str()).unwrap_or("none"),
            duration_ms = start.elapsed().as_millis() as u64,
            "Chat turn extracted"
        );
        Ok(parsed)
    }
}
