//! Structured logging field name constants for steward.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation can query by the same names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied (dropped action, bad payload) |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration (per-date intersections, per-message formatting) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated from the HTTP request.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "inference", "scheduling"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "intent", "summarizer", "matcher", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "extract", "summarize", "confirm", "respond"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Chat session key.
pub const SESSION_ID: &str = "session_id";

/// Identity (email) of the caller.
pub const IDENTITY: &str = "identity";

/// Kind of proposed action ("create_task", "create_meeting").
pub const ACTION_KIND: &str = "action_kind";

/// Pending meeting UUID.
pub const PENDING_MEETING_ID: &str = "pending_meeting_id";

/// Thread UUID.
pub const THREAD_ID: &str = "thread_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a query.
pub const RESULT_COUNT: &str = "result_count";

/// Byte length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

/// Store collection affected: "task", "meeting", "pending_meeting", "thread", "app_user".
pub const COLLECTION: &str = "collection";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
