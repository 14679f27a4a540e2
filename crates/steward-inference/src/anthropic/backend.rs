//! Anthropic Messages API backend.

use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use steward_core::defaults::{ANTHROPIC_MODEL, ANTHROPIC_URL, ANTHROPIC_VERSION, INFERENCE_TIMEOUT_SECS};
use steward_core::{Error, GenerationBackend, GenerationRequest, Result};

use super::types::*;
use crate::error::{to_steward_error, ProviderErrorCode};

/// Configuration for the Anthropic backend.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// Base URL, without the `/messages` suffix.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: ANTHROPIC_URL.to_string(),
            api_key: String::new(),
            model: ANTHROPIC_MODEL.to_string(),
            timeout_seconds: INFERENCE_TIMEOUT_SECS,
        }
    }
}

/// Completion backend for the Anthropic Messages API.
pub struct AnthropicBackend {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicBackend {
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::Config("ANTHROPIC_API_KEY is not set".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Inference(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "anthropic",
            model = %config.model,
            url = %config.base_url,
            "Initializing Anthropic backend"
        );

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        self.client
            .post(url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
    }
}

#[async_trait]
impl GenerationBackend for AnthropicBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let start = Instant::now();
        debug!(
            subsystem = "inference",
            component = "anthropic",
            model = %self.config.model,
            prompt_len = request.prompt.len(),
            "Sending completion request"
        );

        let body = MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system.clone(),
            messages: vec![InputMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
        };

        let response = self
            .build_request("/messages")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Anthropic request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body: AnthropicErrorResponse =
                response.json().await.unwrap_or(AnthropicErrorResponse {
                    error: AnthropicError {
                        error_type: "unknown".to_string(),
                        message: "Unknown error".to_string(),
                    },
                });
            let code = ProviderErrorCode::from_response(status.as_u16(), &body.error.error_type);
            return Err(to_steward_error(
                "Anthropic",
                code,
                &format!("{} {}", status, body.error.message),
            ));
        }

        let result: MessagesResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse Anthropic response: {}", e)))?;

        let text = result
            .text()
            .ok_or_else(|| Error::Inference("Anthropic response had no text content".to_string()))?;

        debug!(
            subsystem = "inference",
            component = "anthropic",
            response_len = text.len(),
            stop_reason = ?result.stop_reason,
            duration_ms = start.elapsed().as_millis() as u64,
            "Completion received"
        );
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn health_check(&self) -> Result<bool> {
        // There is no free endpoint to ping; a models listing needs the same key.
        let url = format!("{}/models", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => Ok(true),
            Ok(resp) => {
                warn!(status = %resp.status(), "Anthropic health check failed");
                Ok(false)
            }
            Err(e) => {
                warn!(error = %e, "Anthropic health check error");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnthropicConfig::default();
        assert_eq!(config.base_url, ANTHROPIC_URL);
        assert_eq!(config.model, "claude-3-haiku-20240307");
        assert_eq!(config.timeout_seconds, INFERENCE_TIMEOUT_SECS);
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let result = AnthropicBackend::new(AnthropicConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_model_name_accessor() {
        let backend = AnthropicBackend::new(AnthropicConfig {
            api_key: "k".to_string(),
            model: "claude-test".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(backend.model_name(), "claude-test");
    }
}
