//! Inference configuration.
//!
//! Selects the completion backend and the sampling settings from environment
//! variables:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `INFERENCE_BACKEND` | `anthropic` (`anthropic`, `openai`, `mock`) |
//! | `ANTHROPIC_API_KEY` | required for `anthropic` |
//! | `ANTHROPIC_BASE_URL` | `https://api.anthropic.com/v1` |
//! | `ANTHROPIC_MODEL` | `claude-3-haiku-20240307` |
//! | `OPENAI_BASE_URL` | `https://api.openai.com/v1` |
//! | `OPENAI_API_KEY` | unset |
//! | `OPENAI_GEN_MODEL` | `gpt-4o-mini` |
//! | `OPENAI_HTTP_REFERER`, `OPENAI_X_TITLE` | unset |
//! | `INFERENCE_TIMEOUT` | 60 seconds |
//! | `INFERENCE_MAX_TOKENS` | 1024 |
//! | `INFERENCE_TEMPERATURE` | 0.7, must be > 0 |

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use steward_core::defaults::{
    ANTHROPIC_MODEL, ANTHROPIC_URL, INFERENCE_TIMEOUT_SECS, MAX_OUTPUT_TOKENS, TEMPERATURE,
};
use steward_core::GenerationBackend;

#[cfg(feature = "anthropic")]
use crate::anthropic::{AnthropicBackend, AnthropicConfig};
#[cfg(feature = "openai")]
use crate::openai::{OpenAIBackend, OpenAIConfig};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid backend: {0}")]
    InvalidBackend(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Backend '{0}' is not compiled into this build")]
    Unavailable(BackendKind),
}

impl From<ConfigError> for steward_core::Error {
    fn from(e: ConfigError) -> Self {
        steward_core::Error::Config(e.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Which completion backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Anthropic,
    OpenAI,
    Mock,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAI),
            "mock" => Ok(Self::Mock),
            _ => Err(ConfigError::InvalidBackend(s.to_string())),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anthropic => write!(f, "anthropic"),
            Self::OpenAI => write!(f, "openai"),
            Self::Mock => write!(f, "mock"),
        }
    }
}

/// Output bound and sampling temperature shared by chat and summary calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionSettings {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
        }
    }
}

impl CompletionSettings {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_tokens == 0 {
            return Err(ConfigError::Validation(
                "INFERENCE_MAX_TOKENS must be positive".to_string(),
            ));
        }
        if !(self.temperature > 0.0 && self.temperature <= 2.0) {
            return Err(ConfigError::Validation(format!(
                "INFERENCE_TEMPERATURE must be in (0, 2], got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// Complete inference configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceConfig {
    pub backend: BackendKind,
    pub settings: CompletionSettings,
    pub timeout_seconds: u64,
    pub anthropic_api_key: Option<String>,
    pub anthropic_base_url: String,
    pub anthropic_model: String,
    pub openai_base_url: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_http_referer: Option<String>,
    pub openai_x_title: Option<String>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            settings: CompletionSettings::default(),
            timeout_seconds: INFERENCE_TIMEOUT_SECS,
            anthropic_api_key: None,
            anthropic_base_url: ANTHROPIC_URL.to_string(),
            anthropic_model: ANTHROPIC_MODEL.to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            openai_http_referer: None,
            openai_x_title: None,
        }
    }
}

impl InferenceConfig {
    /// Load from process environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let backend = match get("INFERENCE_BACKEND") {
            Some(v) => v.parse()?,
            None => defaults.backend,
        };

        let settings = CompletionSettings {
            max_tokens: parse_number(get("INFERENCE_MAX_TOKENS"), "INFERENCE_MAX_TOKENS")?
                .unwrap_or(defaults.settings.max_tokens),
            temperature: parse_number(get("INFERENCE_TEMPERATURE"), "INFERENCE_TEMPERATURE")?
                .unwrap_or(defaults.settings.temperature),
        };

        let config = Self {
            backend,
            settings,
            timeout_seconds: parse_number(get("INFERENCE_TIMEOUT"), "INFERENCE_TIMEOUT")?
                .unwrap_or(defaults.timeout_seconds),
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            anthropic_base_url: get("ANTHROPIC_BASE_URL").unwrap_or(defaults.anthropic_base_url),
            anthropic_model: get("ANTHROPIC_MODEL").unwrap_or(defaults.anthropic_model),
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_model: get("OPENAI_GEN_MODEL").unwrap_or(defaults.openai_model),
            openai_http_referer: get("OPENAI_HTTP_REFERER"),
            openai_x_title: get("OPENAI_X_TITLE"),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.settings.validate()?;
        if self.backend == BackendKind::Anthropic && self.anthropic_api_key.is_none() {
            return Err(ConfigError::Validation(
                "ANTHROPIC_API_KEY is required for the anthropic backend".to_string(),
            ));
        }
        for (name, url) in [
            ("ANTHROPIC_BASE_URL", &self.anthropic_base_url),
            ("OPENAI_BASE_URL", &self.openai_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Validation(format!(
                    "{} must start with http:// or https://, got: {}",
                    name, url
                )));
            }
        }
        Ok(())
    }

    /// Build the configured backend.
    pub fn build_backend(&self) -> steward_core::Result<Arc<dyn GenerationBackend>> {
        info!(
            subsystem = "inference",
            backend = %self.backend,
            max_tokens = self.settings.max_tokens,
            temperature = self.settings.temperature,
            "Selecting completion backend"
        );

        match self.backend {
            #[cfg(feature = "anthropic")]
            BackendKind::Anthropic => Ok(Arc::new(AnthropicBackend::new(AnthropicConfig {
                base_url: self.anthropic_base_url.clone(),
                api_key: self.anthropic_api_key.clone().unwrap_or_default(),
                model: self.anthropic_model.clone(),
                timeout_seconds: self.timeout_seconds,
            })?)),
            #[cfg(feature = "openai")]
            BackendKind::OpenAI => Ok(Arc::new(OpenAIBackend::new(OpenAIConfig {
                base_url: self.openai_base_url.clone(),
                api_key: self.openai_api_key.clone(),
                gen_model: self.openai_model.clone(),
                timeout_seconds: self.timeout_seconds,
                http_referer: self.openai_http_referer.clone(),
                x_title: self.openai_x_title.clone(),
            })?)),
            #[cfg(feature = "mock")]
            BackendKind::Mock => Ok(Arc::new(crate::mock::MockGenerationBackend::new())),
            #[allow(unreachable_patterns)]
            other => Err(ConfigError::Unavailable(other).into()),
        }
    }
}

fn parse_number<T: FromStr>(value: Option<String>, key: &str) -> ConfigResult<Option<T>> {
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::Validation(format!("{} is not a valid number: {}", key, v)))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_key() {
        let config = InferenceConfig::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.backend, BackendKind::Anthropic);
        assert_eq!(config.anthropic_model, "claude-3-haiku-20240307");
        assert_eq!(config.settings.max_tokens, 1024);
        assert!((config.settings.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_anthropic_requires_key() {
        let err = InferenceConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_openai_backend_selection() {
        let config = InferenceConfig::from_lookup(lookup(&[
            ("INFERENCE_BACKEND", "OpenAI"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1"),
            ("OPENAI_GEN_MODEL", "llama3"),
        ]))
        .unwrap();
        assert_eq!(config.backend, BackendKind::OpenAI);
        assert_eq!(config.openai_model, "llama3");
    }

    #[test]
    fn test_invalid_backend() {
        let err = InferenceConfig::from_lookup(lookup(&[("INFERENCE_BACKEND", "ollama")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBackend(_)));
    }

    #[test]
    fn test_temperature_must_be_positive() {
        let err = InferenceConfig::from_lookup(lookup(&[
            ("INFERENCE_BACKEND", "mock"),
            ("INFERENCE_TEMPERATURE", "0"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("INFERENCE_TEMPERATURE"));
    }

    #[test]
    fn test_non_numeric_values_rejected() {
        let err = InferenceConfig::from_lookup(lookup(&[
            ("INFERENCE_BACKEND", "mock"),
            ("INFERENCE_MAX_TOKENS", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_bad_url_rejected() {
        let err = InferenceConfig::from_lookup(lookup(&[
            ("INFERENCE_BACKEND", "openai"),
            ("OPENAI_BASE_URL", "localhost:8080"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("OPENAI_BASE_URL"));
    }

    #[test]
    fn test_config_error_into_core_error() {
        let err: steward_core::Error = ConfigError::InvalidBackend("x".to_string()).into();
        assert!(matches!(err, steward_core::Error::Config(_)));
    }
}
