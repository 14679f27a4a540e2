//! Core data models for steward.
//!
//! Persisted records (tasks, meetings, pending meetings, threads, messages,
//! users) and the request shapes used to create them. Timestamps that the
//! user sees are canonical `YYYY-MM-DDTHH:mm` wall-clock values; bookkeeping
//! timestamps (`created_at`, message `sent_at`) are UTC.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::availability::TimeBlock;
use crate::datetime::{canonical, canonical_option};

// =============================================================================
// PRIORITY
// =============================================================================

/// Task priority. Always one of the three values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Lenient conversion used on model output and form input: anything that
    /// is not a recognized priority becomes `Medium`.
    pub fn coerce(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// TASKS
// =============================================================================

/// A persisted task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub priority: Priority,
    pub completed: bool,
    #[serde(with = "canonical_option", default)]
    pub due_date: Option<NaiveDateTime>,
    pub owner: String,
    #[serde(default)]
    pub participants: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Data needed to create a task. `completed` always starts false.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDateTime>,
    pub owner: String,
    pub participants: Vec<String>,
}

impl NewTask {
    pub fn into_task(self, id: Uuid) -> Task {
        Task {
            id,
            title: self.title,
            priority: self.priority,
            completed: false,
            due_date: self.due_date,
            owner: self.owner,
            participants: self.participants,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// MEETINGS
// =============================================================================

/// A scheduled meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub agenda: String,
    #[serde(with = "canonical")]
    pub time: NaiveDateTime,
    #[serde(default)]
    pub participants: Vec<String>,
    pub organizer: String,
    pub created_at: DateTime<Utc>,
}

impl Meeting {
    /// True when `identity` organizes or attends this meeting.
    pub fn involves(&self, identity: &str) -> bool {
        self.organizer == identity || self.participants.iter().any(|p| p == identity)
    }
}

/// Data needed to create or fully replace a meeting.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeeting {
    pub title: String,
    pub agenda: String,
    pub time: NaiveDateTime,
    pub participants: Vec<String>,
    pub organizer: String,
}

impl NewMeeting {
    pub fn into_meeting(self, id: Uuid) -> Meeting {
        Meeting {
            id,
            title: self.title,
            agenda: self.agenda,
            time: self.time,
            participants: self.participants,
            organizer: self.organizer,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// PENDING MEETINGS
// =============================================================================

/// One participant's availability: date to offered time blocks.
pub type DayAvailability = BTreeMap<NaiveDate, Vec<TimeBlock>>;

/// A meeting waiting for invitees to respond with their availability.
///
/// `availabilities` holds the organiser's submission and one entry per
/// participant who accepted. `responded` lists every participant who has
/// answered, accepted or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMeeting {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub agenda: String,
    pub organiser: String,
    pub participants: Vec<String>,
    pub availabilities: BTreeMap<String, DayAvailability>,
    pub pending_response: u32,
    #[serde(default)]
    pub responded: Vec<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// THREADS AND MESSAGES
// =============================================================================

/// An email-like conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: Uuid,
    pub subject: String,
    pub participants: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
}

impl Thread {
    pub fn includes(&self, identity: &str) -> bool {
        self.participants.iter().any(|p| p == identity)
    }
}

/// A message inside a thread. Threads list messages by `sent_at` ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub sender: String,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// Data needed to start a thread with its first message.
#[derive(Debug, Clone, PartialEq)]
pub struct NewThread {
    pub subject: String,
    pub sender: String,
    pub participants: Vec<String>,
    pub text: String,
}

// =============================================================================
// USERS
// =============================================================================

/// A user profile, keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

/// Trim identities, drop empties and duplicates while keeping first-seen order.
pub fn clean_identities<I, S>(identities: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for identity in identities {
        let trimmed = identity.as_ref().trim();
        if !trimmed.is_empty() && !out.iter().any(|e| e == trimmed) {
            out.push(trimmed.to_string());
        }
    }
    out
}
