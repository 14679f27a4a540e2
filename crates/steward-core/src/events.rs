//! Server events and the broadcast event bus behind snapshot streams.
//!
//! Writers emit a [`ServerEvent`] after every change to tasks, meetings,
//! pending meetings, threads, or messages. Stream handlers subscribe, decide
//! whether the change concerns their caller, and re-query a full snapshot.
//! Events are notifications only; they never carry the snapshot itself.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Who caused an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventActor {
    /// `"system"` or `"user"`.
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl EventActor {
    pub fn system() -> Self {
        Self {
            kind: "system".to_string(),
            id: None,
        }
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self {
            kind: "user".to_string(),
            id: Some(id.into()),
        }
    }
}

/// Envelope wrapping every emitted event.
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    /// UUIDv7, so ids sort by emission time.
    pub event_id: Uuid,
    /// Dot-namespaced type, e.g. `"meeting.changed"`.
    pub event_type: String,
    pub occurred_at: DateTime<Utc>,
    pub actor: EventActor,
    pub payload: ServerEvent,
}

impl EventEnvelope {
    pub fn new(event: ServerEvent, actor: EventActor) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: event.namespaced_event_type().to_string(),
            occurred_at: Utc::now(),
            actor,
            payload: event,
        }
    }
}

/// Change notifications.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// A task owned by `owner` was created, toggled, or deleted.
    TaskChanged { owner: String, task_id: Uuid },
    /// A meeting involving `identities` was created, updated, or deleted.
    MeetingChanged {
        meeting_id: Uuid,
        identities: Vec<String>,
    },
    /// A thread was started.
    ThreadCreated {
        thread_id: Uuid,
        participants: Vec<String>,
    },
    /// A message was posted to a thread.
    MessagePosted { thread_id: Uuid, message_id: Uuid },
    /// A participant answered an invitation; others are still outstanding.
    PendingMeetingUpdated {
        pending_meeting_id: Uuid,
        remaining: u32,
    },
    /// Every participant answered. `outcome` is `scheduled`,
    /// `no_common_slot`, or `all_declined`.
    PendingMeetingResolved {
        pending_meeting_id: Uuid,
        outcome: String,
        identities: Vec<String>,
    },
}

impl ServerEvent {
    pub fn namespaced_event_type(&self) -> &'static str {
        match self {
            ServerEvent::TaskChanged { .. } => "task.changed",
            ServerEvent::MeetingChanged { .. } => "meeting.changed",
            ServerEvent::ThreadCreated { .. } => "thread.created",
            ServerEvent::MessagePosted { .. } => "message.posted",
            ServerEvent::PendingMeetingUpdated { .. } => "pending_meeting.updated",
            ServerEvent::PendingMeetingResolved { .. } => "pending_meeting.resolved",
        }
    }

    /// True when the meeting list of `identity` may have changed.
    pub fn touches_meetings_of(&self, identity: &str) -> bool {
        match self {
            ServerEvent::MeetingChanged { identities, .. }
            | ServerEvent::PendingMeetingResolved { identities, .. } => {
                identities.iter().any(|i| i == identity)
            }
            _ => false,
        }
    }

    /// True when the message list of `thread` may have changed.
    pub fn touches_thread(&self, thread: Uuid) -> bool {
        matches!(self, ServerEvent::MessagePosted { thread_id, .. } if *thread_id == thread)
    }
}

/// Broadcast-based event bus.
///
/// Slow receivers that fall behind get a `Lagged` error and miss events;
/// snapshot streams recover by re-querying on the next event.
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit a system-caused event. Dropped silently without subscribers.
    pub fn emit(&self, event: ServerEvent) {
        self.emit_as(event, EventActor::system());
    }

    /// Emit an event attributed to `actor`.
    pub fn emit_as(&self, event: ServerEvent, actor: EventActor) {
        let envelope = EventEnvelope::new(event, actor);
        let subscriber_count = self.tx.receiver_count();
        tracing::debug!(
            event_type = %envelope.event_type,
            event_id = %envelope.event_id,
            subscriber_count,
            "EventBus emit"
        );
        let _ = self.tx.send(envelope);
    }

    /// Subscribe to enveloped events. Each subscriber gets its own stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
