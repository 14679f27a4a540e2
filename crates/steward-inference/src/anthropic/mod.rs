//! Anthropic Messages API backend.
//!
//! Sends one user turn with a system instruction and returns the
//! concatenated text blocks of the reply.

mod backend;
mod types;

pub use backend::{AnthropicBackend, AnthropicConfig};
pub use types::*;
