//! Validated actions proposed by the assistant.
//!
//! A [`ProposedAction`] is only ever built from model output after
//! validation, so every field already holds a legal value.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::datetime::{canonical, canonical_option, render_human};
use crate::models::{NewMeeting, NewTask, Priority};

/// Discriminator for proposed actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    CreateTask,
    CreateMeeting,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::CreateTask => "create_task",
            ActionKind::CreateMeeting => "create_meeting",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "create_task" => Some(ActionKind::CreateTask),
            "create_meeting" => Some(ActionKind::CreateMeeting),
            _ => None,
        }
    }
}

/// Task fields extracted from conversation or a summarized thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub priority: Priority,
    #[serde(with = "canonical_option", default)]
    pub due_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub participants: Vec<String>,
}

impl TaskDraft {
    pub fn into_new_task(self, owner: &str) -> NewTask {
        NewTask {
            title: self.title,
            priority: self.priority,
            due_date: self.due_date,
            owner: owner.to_string(),
            participants: self.participants,
        }
    }
}

/// Meeting fields extracted from conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingDraft {
    pub title: String,
    #[serde(with = "canonical")]
    pub time: NaiveDateTime,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub agenda: String,
}

impl MeetingDraft {
    pub fn into_new_meeting(self, organizer: &str) -> NewMeeting {
        NewMeeting {
            title: self.title,
            agenda: self.agenda,
            time: self.time,
            participants: self.participants,
            organizer: organizer.to_string(),
        }
    }
}

/// An action awaiting the user's approval.
///
/// Serialized in the same shape the model emits:
/// `{"action":"create_task","task":{...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ProposedAction {
    CreateTask { task: TaskDraft },
    CreateMeeting { meeting: MeetingDraft },
}

impl ProposedAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            ProposedAction::CreateTask { .. } => ActionKind::CreateTask,
            ProposedAction::CreateMeeting { .. } => ActionKind::CreateMeeting,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ProposedAction::CreateTask { task } => &task.title,
            ProposedAction::CreateMeeting { meeting } => &meeting.title,
        }
    }

    /// Question shown to the user before anything is written.
    pub fn confirmation_prompt(&self) -> String {
        match self {
            ProposedAction::CreateTask { task } => {
                let due = task
                    .due_date
                    .map(|d| format!(" due {}", render_human(&d)))
                    .unwrap_or_default();
                format!(
                    "Create task \"{}\" ({} priority){}? Confirm or cancel.",
                    task.title, task.priority, due
                )
            }
            ProposedAction::CreateMeeting { meeting } => {
                let with = if meeting.participants.is_empty() {
                    String::new()
                } else {
                    format!(" with {}", meeting.participants.join(", "))
                };
                format!(
                    "Schedule meeting \"{}\" on {}{}? Confirm or cancel.",
                    meeting.title,
                    render_human(&meeting.time),
                    with
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::parse_canonical;

    fn task() -> ProposedAction {
        ProposedAction::CreateTask {
            task: TaskDraft {
                title: "Review docs".to_string(),
                priority: Priority::High,
                due_date: parse_canonical("2025-02-02T15:00"),
                participants: vec![],
            },
        }
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(task()).unwrap();
        assert_eq!(json["action"], "create_task");
        assert_eq!(json["task"]["title"], "Review docs");
        assert_eq!(json["task"]["dueDate"], "2025-02-02T15:00");
    }

    #[test]
    fn test_task_prompt_mentions_human_date() {
        let prompt = task().confirmation_prompt();
        assert!(prompt.contains("Review docs"));
        assert!(prompt.contains("High priority"));
        assert!(prompt.contains("Sun, 2 Feb 2025 at 15:00"));
    }

    #[test]
    fn test_meeting_prompt_lists_participants() {
        let action = ProposedAction::CreateMeeting {
            meeting: MeetingDraft {
                title: "Sync".to_string(),
                time: parse_canonical("2025-02-03T10:00").unwrap(),
                participants: vec!["a@x.io".to_string(), "b@x.io".to_string()],
                agenda: String::new(),
            },
        };
        assert_eq!(action.kind(), ActionKind::CreateMeeting);
        let prompt = action.confirmation_prompt();
        assert!(prompt.contains("Mon, 3 Feb 2025 at 10:00"));
        assert!(prompt.contains("a@x.io, b@x.io"));
    }

    #[test]
    fn test_action_kind_parse() {
        assert_eq!(ActionKind::parse("create_task"), Some(ActionKind::CreateTask));
        assert_eq!(ActionKind::parse("delete_task"), None);
    }
}
