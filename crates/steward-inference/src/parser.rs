//! Response parser and validator for chat completions.
//!
//! Turns raw model text into a conversational reply plus, at most, one
//! validated [`ProposedAction`]. Every failure on the payload side degrades
//! to a reply without an action; nothing here returns an error to the user.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use steward_core::{
    clean_identities, normalize, ActionKind, DateTarget, MeetingDraft, Priority, ProposedAction,
    TaskDraft,
};

use crate::response::{first_json_value, split_on_sentinel};
use crate::thinking::strip_thinking;

/// Why a payload produced no action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("payload is not valid JSON: {0}")]
    Malformed(String),

    #[error("unrecognized action '{0}'")]
    UnknownAction(String),

    #[error("missing or empty field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' is not a usable date/time: {reason}")]
    InvalidDate { field: &'static str, reason: String },
}

/// Parsed chat completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedReply {
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ProposedAction>,
}

/// Parse a chat completion relative to the reference time `now`.
pub fn parse_chat_response(raw: &str, now: NaiveDateTime) -> ParsedReply {
    let answer = strip_thinking(raw);
    let split = split_on_sentinel(&answer);

    let Some(segment) = split.payload else {
        return ParsedReply {
            reply: split.reply,
            action: None,
        };
    };

    let action = first_json_value(segment)
        .map_err(|e| PayloadError::Malformed(e.to_string()))
        .and_then(|value| validate_action(&value, now));

    match action {
        Ok(action) => {
            debug!(
                subsystem = "inference",
                component = "parser",
                action_kind = action.kind().as_str(),
                "Payload validated"
            );
            ParsedReply {
                reply: split.reply,
                action: Some(action),
            }
        }
        Err(e) => {
            warn!(
                subsystem = "inference",
                component = "parser",
                error = %e,
                "Dropping action from model reply"
            );
            ParsedReply {
                reply: split.reply,
                action: None,
            }
        }
    }
}

/// Validate and repair a decoded payload into a typed action.
pub fn validate_action(value: &Value, now: NaiveDateTime) -> Result<ProposedAction, PayloadError> {
    let discriminator = value
        .get("action")
        .and_then(Value::as_str)
        .ok_or(PayloadError::MissingField("action"))?;

    match ActionKind::parse(discriminator) {
        Some(ActionKind::CreateTask) => {
            let fields = object_field(value, "task")?;
            Ok(ProposedAction::CreateTask {
                task: validate_task(fields, now)?,
            })
        }
        Some(ActionKind::CreateMeeting) => {
            let fields = object_field(value, "meeting")?;
            Ok(ProposedAction::CreateMeeting {
                meeting: validate_meeting(fields, now)?,
            })
        }
        None => Err(PayloadError::UnknownAction(discriminator.to_string())),
    }
}

fn validate_task(fields: &Map<String, Value>, now: NaiveDateTime) -> Result<TaskDraft, PayloadError> {
    let title = required_text(fields, "title")?;
    let priority = Priority::coerce(fields.get("priority").and_then(Value::as_str));

    let due = text_field(fields, &["dueDate", "due_date"]).ok_or(PayloadError::MissingField("dueDate"))?;
    let due_date = normalize(due, now, DateTarget::Task).map_err(|e| PayloadError::InvalidDate {
        field: "dueDate",
        reason: e.to_string(),
    })?;

    Ok(TaskDraft {
        title,
        priority,
        due_date: Some(due_date),
        participants: identities(fields.get("participants")),
    })
}

fn validate_meeting(
    fields: &Map<String, Value>,
    now: NaiveDateTime,
) -> Result<MeetingDraft, PayloadError> {
    let title = required_text(fields, "title")?;

    let time = text_field(fields, &["time"]).ok_or(PayloadError::MissingField("time"))?;
    let time = normalize(time, now, DateTarget::Meeting).map_err(|e| PayloadError::InvalidDate {
        field: "time",
        reason: e.to_string(),
    })?;

    Ok(MeetingDraft {
        title,
        time,
        participants: identities(fields.get("participants")),
        agenda: text_field(fields, &["agenda"]).unwrap_or_default().trim().to_string(),
    })
}

fn object_field<'a>(
    value: &'a Value,
    key: &'static str,
) -> Result<&'a Map<String, Value>, PayloadError> {
    value
        .get(key)
        .and_then(Value::as_object)
        .ok_or(PayloadError::MissingField(key))
}

fn required_text(fields: &Map<String, Value>, key: &'static str) -> Result<String, PayloadError> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(PayloadError::MissingField(key))
}

/// First non-empty string among `keys`.
pub(crate) fn text_field<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| fields.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
}

/// Participant identities from a JSON array (or a comma-separated string).
pub(crate) fn identities(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => clean_identities(items.iter().filter_map(Value::as_str)),
        Some(Value::String(s)) => clean_identities(s.split(',')),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use steward_core::{format_canonical, parse_canonical};

    fn now() -> NaiveDateTime {
        parse_canonical("2025-02-01T09:00").unwrap()
    }

    fn task_of(parsed: &ParsedReply) -> &TaskDraft {
        match parsed.action.as_ref() {
            Some(ProposedAction::CreateTask { task }) => task,
            other => panic!("expected task, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_reply_without_sentinel() {
        let parsed = parse_chat_response("Happy to help! What do you need?", now());
        assert_eq!(parsed.reply, "Happy to help! What do you need?");
        assert!(parsed.action.is_none());
    }

    #[test]
    fn test_task_with_natural_language_due_date() {
        let raw = r#"I'll create that task for you.
__JSON_DATA__
{
  "action": "create_task",
  "task": {"title": "Review docs", "priority": "High", "dueDate": "tomorrow at 3pm"}
}"#;
        let parsed = parse_chat_response(raw, now());
        assert_eq!(parsed.reply, "I'll create that task for you.");
        let task = task_of(&parsed);
        assert_eq!(task.title, "Review docs");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(format_canonical(&task.due_date.unwrap()), "2025-02-02T15:00");
    }

    #[test]
    fn test_date_only_due_defaults_to_end_of_day() {
        let raw = r#"Ok __JSON_DATA__ {"action":"create_task","task":{"title":"Pay rent","priority":"Low","dueDate":"2025-02-05"}}"#;
        let parsed = parse_chat_response(raw, now());
        assert_eq!(
            format_canonical(&task_of(&parsed).due_date.unwrap()),
            "2025-02-05T23:59"
        );
    }

    #[test]
    fn test_priority_out_of_enum_becomes_medium() {
        for priority in [json!("Urgent"), json!(3), json!(null), json!("")] {
            let value = json!({
                "action": "create_task",
                "task": {"title": "x", "priority": priority, "dueDate": "2025-02-05T10:00"}
            });
            match validate_action(&value, now()).unwrap() {
                ProposedAction::CreateTask { task } => assert_eq!(task.priority, Priority::Medium),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_completed_flag_is_ignored() {
        let value = json!({
            "action": "create_task",
            "task": {"title": "x", "priority": "Low", "dueDate": "2025-02-05T10:00", "completed": true}
        });
        let action = validate_action(&value, now()).unwrap();
        let ProposedAction::CreateTask { task } = action else {
            panic!("expected task");
        };
        assert!(!task.into_new_task("a@x.io").into_task(uuid::Uuid::nil()).completed);
    }

    #[test]
    fn test_malformed_payload_keeps_reply() {
        let parsed = parse_chat_response("Sure thing! __JSON_DATA__ {\"action\": ", now());
        assert_eq!(parsed.reply, "Sure thing!");
        assert!(parsed.action.is_none());
    }

    #[test]
    fn test_unknown_action_is_not_actionable() {
        let raw = r#"Done __JSON_DATA__ {"action":"delete_task","task":{"title":"x"}}"#;
        assert!(parse_chat_response(raw, now()).action.is_none());
        assert_eq!(
            validate_action(&json!({"action": "send_email"}), now()),
            Err(PayloadError::UnknownAction("send_email".to_string()))
        );
    }

    #[test]
    fn test_missing_title_or_due_date_drops_task() {
        let no_title = json!({"action":"create_task","task":{"title":"  ","dueDate":"2025-02-05"}});
        assert_eq!(
            validate_action(&no_title, now()),
            Err(PayloadError::MissingField("title"))
        );
        let no_due = json!({"action":"create_task","task":{"title":"x"}});
        assert_eq!(
            validate_action(&no_due, now()),
            Err(PayloadError::MissingField("dueDate"))
        );
        let bad_due = json!({"action":"create_task","task":{"title":"x","dueDate":"someday"}});
        assert!(matches!(
            validate_action(&bad_due, now()),
            Err(PayloadError::InvalidDate { field: "dueDate", .. })
        ));
    }

    #[test]
    fn test_meeting_payload() {
        let raw = r#"Let's set that up.
__JSON_DATA__
```json
{"action":"create_meeting","meeting":{"title":"Design sync","time":"2025-02-03T10:00","participants":["b@x.io"," c@x.io ","b@x.io",""]}}
```"#;
        let parsed = parse_chat_response(raw, now());
        match parsed.action {
            Some(ProposedAction::CreateMeeting { meeting }) => {
                assert_eq!(format_canonical(&meeting.time), "2025-02-03T10:00");
                assert_eq!(meeting.participants, vec!["b@x.io", "c@x.io"]);
                assert_eq!(meeting.agenda, "");
            }
            other => panic!("expected meeting, got {:?}", other),
        }
    }

    #[test]
    fn test_meeting_without_time_is_dropped() {
        let date_only = json!({"action":"create_meeting","meeting":{"title":"Sync","time":"2025-02-03"}});
        assert!(matches!(
            validate_action(&date_only, now()),
            Err(PayloadError::InvalidDate { field: "time", .. })
        ));
        let missing = json!({"action":"create_meeting","meeting":{"title":"Sync"}});
        assert_eq!(
            validate_action(&missing, now()),
            Err(PayloadError::MissingField("time"))
        );
    }

    #[test]
    fn test_thinking_is_stripped_before_split() {
        let raw = "<think>Use __JSON_DATA__ format</think>Hello there.";
        let parsed = parse_chat_response(raw, now());
        assert_eq!(parsed.reply, "Hello there.");
        assert!(parsed.action.is_none());
    }
}
