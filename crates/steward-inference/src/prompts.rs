//! Instruction prompts and user-turn formatting for the two completion calls.

use chrono::{NaiveDateTime, SecondsFormat};

use steward_core::defaults::PAYLOAD_SENTINEL;
use steward_core::{format_canonical, Message};

/// System instruction for chat turns.
pub fn chat_system_prompt(now: NaiveDateTime) -> String {
    format!(
        r#"You are a personal assistant that manages tasks and meetings. Keep responses brief and focused.

The current date and time is {now} ({weekday}).

You can propose exactly two actions:

1. Create a task: extract the title, the priority (High, Medium or Low) and the due date.
2. Create a meeting: extract the title, the time, the participants' email addresses and the agenda.

Convert every date and time to the format YYYY-MM-DDTHH:mm, resolving relative
expressions such as "tomorrow" or "next Friday" against the current date.
A task without a time of day may use YYYY-MM-DD. A meeting always needs a time of day;
if the user gave none, ask for it instead of proposing the meeting.

When proposing an action respond in this exact format:

Brief confirmation message
{sentinel}
{{
  "action": "create_task",
  "task": {{
    "title": "task title",
    "priority": "High",
    "dueDate": "YYYY-MM-DDTHH:mm"
  }}
}}

or

Brief confirmation message
{sentinel}
{{
  "action": "create_meeting",
  "meeting": {{
    "title": "meeting title",
    "time": "YYYY-MM-DDTHH:mm",
    "participants": ["email1", "email2"],
    "agenda": "meeting purpose"
  }}
}}

For anything else, reply with short, helpful text and no {sentinel} section."#,
        now = format_canonical(&now),
        weekday = now.format("%A"),
        sentinel = PAYLOAD_SENTINEL,
    )
}

/// User turn for a chat message.
pub fn chat_user_prompt(user_id: &str, message: &str, now: NaiveDateTime) -> String {
    format!(
        "User ID: {}\nMessage: {}\nToday: {}",
        user_id,
        message,
        format_canonical(&now)
    )
}

/// System instruction for thread summaries.
pub fn summary_system_prompt(now: NaiveDateTime) -> String {
    format!(
        r#"You are an assistant that analyzes email threads and extracts key information. For each analysis:

1. Provide a brief summary of the email thread
2. Identify any tasks that need to be created
3. Identify any meetings that need to be scheduled

The current date and time is {now}. Write all dates and times as YYYY-MM-DDTHH:mm.

Format your response as:

Brief summary of the thread content
{sentinel}
{{
  "summary": "concise summary here",
  "tasks": [
    {{
      "title": "task description",
      "priority": "High/Medium/Low",
      "dueDate": "YYYY-MM-DDTHH:mm",
      "participants": ["email1"],
      "extracted_from": "relevant email quote"
    }}
  ],
  "meetings": [
    {{
      "title": "meeting title",
      "time": "YYYY-MM-DDTHH:mm",
      "participants": ["email1", "email2"],
      "agenda": "meeting purpose",
      "extracted_from": "relevant email quote"
    }}
  ]
}}

Use null for dueDate/time if not specified in the email."#,
        now = format_canonical(&now),
        sentinel = PAYLOAD_SENTINEL,
    )
}

/// Render one message block.
fn format_message(message: &Message) -> String {
    format!(
        "From: {}\nTime: {}\nContent: {}\n",
        message.sender,
        message.sent_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        message.text
    )
}

/// User turn for a thread summary: subject plus messages in the given order.
pub fn summary_user_prompt(subject: &str, messages: &[Message]) -> String {
    let thread = messages
        .iter()
        .map(format_message)
        .collect::<Vec<_>>()
        .join("\n---\n");
    format!("Subject: {}\n\nEmail Thread:\n{}", subject, thread)
}
