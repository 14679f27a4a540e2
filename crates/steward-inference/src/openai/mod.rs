//! OpenAI-compatible chat completion backend.
//!
//! Works with any endpoint that speaks the chat completions protocol:
//! OpenAI, OpenRouter, vLLM, LM Studio, or Ollama in compatibility mode.

mod backend;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig, DEFAULT_GEN_MODEL, DEFAULT_OPENAI_URL};
pub use types::*;
