//! # steward-inference
//!
//! Completion backends and reply handling for the steward assistant.
//!
//! This crate provides:
//! - Anthropic Messages backend (feature `anthropic`, default)
//! - OpenAI-compatible chat completions backend (feature `openai`, default)
//! - Prompt construction for chat turns and thread summaries
//! - Sentinel splitting and payload validation into proposed actions
//! - Thread summary parsing into task and meeting candidates
//! - A deterministic mock backend (feature `mock`)
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use steward_inference::{CompletionSettings, InferenceConfig, IntentExtractor};
//!
//! #[tokio::main]
//! async fn main() -> steward_core::Result<()> {
//!     let config = InferenceConfig::from_env()?;
//!     let extractor = IntentExtractor::new(config.build_backend()?, CompletionSettings::default());
//!     let now = chrono::Local::now().naive_local();
//!     let parsed = extractor.extract("Remind me to call Sam tomorrow", "a@x.io", now).await?;
//!     println!("{}", parsed.reply);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod intent;
pub mod parser;
pub mod prompts;
pub mod response;
pub mod summarizer;
pub mod thinking;

#[cfg(feature = "anthropic")]
pub mod anthropic;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(feature = "anthropic")]
pub use anthropic::{AnthropicBackend, AnthropicConfig};
#[cfg(feature = "openai")]
pub use openai::{OpenAIBackend, OpenAIConfig};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockGenerationBackend;

pub use config::{BackendKind, CompletionSettings, ConfigError, InferenceConfig};
pub use error::ProviderErrorCode;
pub use intent::IntentExtractor;
pub use parser::{parse_chat_response, validate_action, ParsedReply, PayloadError};
pub use summarizer::{
    parse_summary_response, MeetingCandidate, TaskCandidate, ThreadSummarizer, ThreadSummary,
    PARSE_FAILURE,
};
pub use thinking::strip_thinking;
