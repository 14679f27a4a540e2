//! Core traits for steward abstractions.
//!
//! These traits define the interfaces that storage and completion backends
//! implement, enabling pluggable backends and testability.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// COMPLETION
// =============================================================================

/// One completion call: a fixed system instruction plus one user message.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Backend for text generation.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Run one completion and return the raw reply text.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;

    /// Check if the backend is configured and reachable.
    async fn health_check(&self) -> Result<bool>;
}

// =============================================================================
// STORAGE
// =============================================================================

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn insert(&self, task: NewTask) -> Result<Task>;

    async fn get(&self, id: Uuid) -> Result<Option<Task>>;

    /// Tasks owned by `owner`, due date ascending, undated last.
    async fn list_for_owner(&self, owner: &str) -> Result<Vec<Task>>;

    /// Flip completion and return the updated task.
    async fn toggle(&self, id: Uuid) -> Result<Task>;

    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait MeetingRepository: Send + Sync {
    async fn insert(&self, meeting: NewMeeting) -> Result<Meeting>;

    async fn get(&self, id: Uuid) -> Result<Option<Meeting>>;

    /// Replace every editable field of a meeting.
    async fn update(&self, id: Uuid, meeting: NewMeeting) -> Result<Meeting>;

    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Meetings at or after `from` that `identity` organizes or attends,
    /// ordered by time.
    async fn list_upcoming(&self, identity: &str, from: NaiveDateTime) -> Result<Vec<Meeting>>;
}

#[async_trait]
pub trait PendingMeetingRepository: Send + Sync {
    async fn insert(&self, pending: PendingMeeting) -> Result<PendingMeeting>;

    async fn get(&self, id: Uuid) -> Result<Option<PendingMeeting>>;

    /// Overwrite a pending meeting. Fails with `Conflict` when the stored
    /// response count no longer equals `expected_pending`.
    async fn save(&self, pending: &PendingMeeting, expected_pending: u32) -> Result<()>;

    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Pending meetings `identity` is invited to and has not answered.
    async fn list_awaiting(&self, identity: &str) -> Result<Vec<PendingMeeting>>;
}

#[async_trait]
pub trait ThreadRepository: Send + Sync {
    /// Create a thread with its first message.
    async fn create(&self, thread: NewThread) -> Result<(Thread, Message)>;

    async fn get(&self, id: Uuid) -> Result<Option<Thread>>;

    /// Threads `identity` participates in, most recent activity first.
    async fn list_for(&self, identity: &str) -> Result<Vec<Thread>>;

    async fn post_message(&self, thread_id: Uuid, sender: &str, text: &str) -> Result<Message>;

    /// Messages ordered by send time ascending.
    async fn messages(&self, thread_id: Uuid) -> Result<Vec<Message>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn upsert(&self, email: &str, name: &str) -> Result<User>;

    /// Users whose email starts with `prefix` (case-insensitive).
    async fn search_by_email_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<User>>;
}
