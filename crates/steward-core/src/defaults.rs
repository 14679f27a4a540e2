//! Centralized default constants for steward.
//!
//! Crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// COMPLETION PROTOCOL
// =============================================================================

/// Literal token separating the conversational reply from the JSON payload.
pub const PAYLOAD_SENTINEL: &str = "__JSON_DATA__";

/// Maximum output tokens requested from the completion service.
pub const MAX_OUTPUT_TOKENS: u32 = 1024;

/// Sampling temperature for chat and summary calls. Must stay above zero.
pub const TEMPERATURE: f32 = 0.7;

/// Default Anthropic model.
pub const ANTHROPIC_MODEL: &str = "claude-3-haiku-20240307";

/// Default Anthropic API endpoint.
pub const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1";

/// Anthropic API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Request timeout for completion calls, in seconds.
pub const INFERENCE_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// DATES AND TIMES
// =============================================================================

/// Canonical timestamp format: minute precision, no offset.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Date key format used in availability maps.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Hour used when a task has a date but no time (23:59).
pub const TASK_DEFAULT_HOUR: u32 = 23;

/// Minute used when a task has a date but no time (23:59).
pub const TASK_DEFAULT_MINUTE: u32 = 59;

/// First hour of the standard availability grid.
pub const GRID_START_HOUR: u32 = 9;

/// Number of hourly blocks in the standard availability grid (9:00 - 18:00).
pub const GRID_BLOCKS: u32 = 9;

// =============================================================================
// SESSIONS AND EVENTS
// =============================================================================

/// Maximum number of chat sessions kept in memory.
pub const SESSION_CAPACITY: usize = 1024;

/// Transcript entries kept per chat session; older turns are dropped first.
pub const TRANSCRIPT_CAPACITY: usize = 200;

/// Event bus buffer capacity.
pub const EVENT_BUS_CAPACITY: usize = 256;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP port.
pub const SERVER_PORT: u16 = 3000;

/// Default rate limit: requests per period.
pub const RATE_LIMIT_REQUESTS: u32 = 100;

/// Default rate limit period in seconds.
pub const RATE_LIMIT_PERIOD_SECS: u64 = 60;
