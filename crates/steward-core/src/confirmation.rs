//! Chat session state and the confirmation workflow.
//!
//! Each session holds at most one [`ProposedAction`]. A new proposal replaces
//! the outstanding one. Nothing is written until the user confirms; a failed
//! write discards the proposal and is reported in the transcript.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::actions::{ActionKind, ProposedAction};
use crate::defaults::TRANSCRIPT_CAPACITY;
use crate::error::{Error, Result};
use crate::models::{Meeting, Task};

pub const CANCELLED_ACK: &str = "Okay, I've cancelled that.";
pub const FAILED_ACK: &str = "Sorry, I couldn't save that. Nothing was created.";

/// Persists confirmed actions on behalf of `owner`.
#[async_trait]
pub trait ActionCommitter: Send + Sync {
    async fn commit(&self, owner: &str, action: ProposedAction) -> Result<CommittedAction>;
}

/// The record created by a confirmed action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum CommittedAction {
    Task(Task),
    Meeting(Meeting),
}

impl CommittedAction {
    pub fn acknowledgment(&self) -> String {
        match self {
            CommittedAction::Task(task) => format!("Done! Task \"{}\" has been created.", task.title),
            CommittedAction::Meeting(meeting) => {
                format!("Done! Meeting \"{}\" has been scheduled.", meeting.title)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", content = "action", rename_all = "snake_case")]
pub enum ConfirmationState {
    #[default]
    Idle,
    AwaitingConfirmation(ProposedAction),
}

/// Outcome of [`ChatSession::confirm`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConfirmOutcome {
    Committed { record: CommittedAction, message: String },
    Failed { message: String },
}

/// Identifies a summary candidate for one-shot acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateKey {
    pub kind: ActionKind,
    pub title: String,
}

impl CandidateKey {
    pub fn new(kind: ActionKind, title: &str) -> Self {
        Self {
            kind,
            title: title.trim().to_string(),
        }
    }
}

/// Per-session chat state.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    transcript: Vec<TranscriptEntry>,
    state: ConfirmationState,
    accepted_candidates: HashSet<CandidateKey>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn state(&self) -> &ConfirmationState {
        &self.state
    }

    pub fn pending(&self) -> Option<&ProposedAction> {
        match &self.state {
            ConfirmationState::AwaitingConfirmation(action) => Some(action),
            ConfirmationState::Idle => None,
        }
    }

    fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.transcript.push(TranscriptEntry {
            speaker,
            text: text.into(),
            at: Utc::now(),
        });
        if self.transcript.len() > TRANSCRIPT_CAPACITY {
            let excess = self.transcript.len() - TRANSCRIPT_CAPACITY;
            self.transcript.drain(..excess);
        }
    }

    /// Record a chat turn. With an action, the session moves to awaiting
    /// confirmation and the confirmation prompt is returned.
    pub fn record_turn(
        &mut self,
        user_text: &str,
        reply: &str,
        action: Option<ProposedAction>,
    ) -> Option<String> {
        self.push(Speaker::User, user_text);
        if !reply.is_empty() {
            self.push(Speaker::Assistant, reply);
        }

        let action = action?;
        if let Some(previous) = self.pending() {
            tracing::debug!(
                subsystem = "scheduling",
                component = "confirmation",
                replaced_kind = previous.kind().as_str(),
                "Outstanding proposal replaced"
            );
        }
        let prompt = action.confirmation_prompt();
        self.push(Speaker::Assistant, prompt.clone());
        self.state = ConfirmationState::AwaitingConfirmation(action);
        Some(prompt)
    }

    /// Commit the outstanding proposal. The session is idle afterwards
    /// whether or not the write succeeded.
    pub async fn confirm(
        &mut self,
        owner: &str,
        committer: &dyn ActionCommitter,
    ) -> Result<ConfirmOutcome> {
        let action = match std::mem::take(&mut self.state) {
            ConfirmationState::AwaitingConfirmation(action) => action,
            ConfirmationState::Idle => {
                return Err(Error::Conflict("no action is awaiting confirmation".to_string()))
            }
        };
        let kind = action.kind();

        match committer.commit(owner, action).await {
            Ok(record) => {
                let message = record.acknowledgment();
                self.push(Speaker::Assistant, message.clone());
                Ok(ConfirmOutcome::Committed { record, message })
            }
            Err(e) => {
                tracing::error!(
                    subsystem = "scheduling",
                    component = "confirmation",
                    action_kind = kind.as_str(),
                    error = %e,
                    "Confirmed action could not be saved"
                );
                self.push(Speaker::Assistant, FAILED_ACK);
                Ok(ConfirmOutcome::Failed {
                    message: FAILED_ACK.to_string(),
                })
            }
        }
    }

    /// Discard the outstanding proposal without writing anything.
    pub fn reject(&mut self) -> Result<String> {
        match std::mem::take(&mut self.state) {
            ConfirmationState::AwaitingConfirmation(_) => {
                self.push(Speaker::Assistant, CANCELLED_ACK);
                Ok(CANCELLED_ACK.to_string())
            }
            ConfirmationState::Idle => {
                Err(Error::Conflict("no action is awaiting confirmation".to_string()))
            }
        }
    }

    /// Mark a summary candidate as created. Returns false if it already was.
    pub fn mark_candidate_accepted(&mut self, key: CandidateKey) -> bool {
        self.accepted_candidates.insert(key)
    }

    pub fn candidate_accepted(&self, key: &CandidateKey) -> bool {
        self.accepted_candidates.contains(key)
    }

    /// Undo a mark after the write it guarded failed.
    pub fn unmark_candidate(&mut self, key: &CandidateKey) {
        self.accepted_candidates.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::actions::TaskDraft;
    use crate::datetime::parse_canonical;
    use crate::models::Priority;

    struct RecordingCommitter {
        writes: AtomicUsize,
        fail: bool,
    }

    impl RecordingCommitter {
        fn new(fail: bool) -> Self {
            Self {
                writes: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl ActionCommitter for RecordingCommitter {
        async fn commit(&self, owner: &str, action: ProposedAction) -> Result<CommittedAction> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Internal("store unavailable".to_string()));
            }
            match action {
                ProposedAction::CreateTask { task } => Ok(CommittedAction::Task(
                    task.into_new_task(owner).into_task(uuid::Uuid::nil()),
                )),
                ProposedAction::CreateMeeting { meeting } => Ok(CommittedAction::Meeting(
                    meeting.into_new_meeting(owner).into_meeting(uuid::Uuid::nil()),
                )),
            }
        }
    }

    fn task(title: &str) -> ProposedAction {
        ProposedAction::CreateTask {
            task: TaskDraft {
                title: title.to_string(),
                priority: Priority::High,
                due_date: parse_canonical("2025-02-02T15:00"),
                participants: vec![],
            },
        }
    }

    #[test]
    fn test_plain_reply_stays_idle() {
        let mut session = ChatSession::new();
        assert!(session.record_turn("hi", "Hello!", None).is_none());
        assert_eq!(session.state(), &ConfirmationState::Idle);
        assert_eq!(session.transcript().len(), 2);
    }

    #[test]
    fn test_proposal_awaits_confirmation() {
        let mut session = ChatSession::new();
        let prompt = session.record_turn("add task", "Sure.", Some(task("Review docs")));
        assert!(prompt.unwrap().contains("Review docs"));
        assert_eq!(session.pending().unwrap().title(), "Review docs");
    }

    #[test]
    fn test_transcript_keeps_most_recent_entries() {
        let mut session = ChatSession::new();
        for i in 0..TRANSCRIPT_CAPACITY {
            session.record_turn(&format!("question {}", i), "answer", None);
        }
        let transcript = session.transcript();
        assert_eq!(transcript.len(), TRANSCRIPT_CAPACITY);
        assert_eq!(
            transcript[0].text,
            format!("question {}", TRANSCRIPT_CAPACITY / 2)
        );
        assert_eq!(transcript[TRANSCRIPT_CAPACITY - 1].text, "answer");
    }

    #[test]
    fn test_last_proposal_wins() {
        let mut session = ChatSession::new();
        session.record_turn("one", "", Some(task("First")));
        session.record_turn("two", "", Some(task("Second")));
        assert_eq!(session.pending().unwrap().title(), "Second");
    }

    #[tokio::test]
    async fn test_reject_never_writes() {
        let committer = RecordingCommitter::new(false);
        let mut session = ChatSession::new();
        session.record_turn("add task", "Sure.", Some(task("Review docs")));

        assert_eq!(session.reject().unwrap(), CANCELLED_ACK);
        assert!(session.pending().is_none());
        assert_eq!(committer.writes.load(Ordering::SeqCst), 0);
        assert!(matches!(
            session.confirm("a@x.io", &committer).await,
            Err(Error::Conflict(_))
        ));
        assert_eq!(committer.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_confirm_commits_once() {
        let committer = RecordingCommitter::new(false);
        let mut session = ChatSession::new();
        session.record_turn("add task", "Sure.", Some(task("Review docs")));

        let outcome = session.confirm("a@x.io", &committer).await.unwrap();
        match outcome {
            ConfirmOutcome::Committed { record, message } => {
                assert!(message.contains("Review docs"));
                match record {
                    CommittedAction::Task(t) => {
                        assert_eq!(t.owner, "a@x.io");
                        assert!(!t.completed);
                    }
                    other => panic!("expected task, got {:?}", other),
                }
            }
            other => panic!("expected committed, got {:?}", other),
        }
        assert!(session.pending().is_none());
        assert!(session.confirm("a@x.io", &committer).await.is_err());
        assert_eq!(committer.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_confirm_failure_discards_and_reports() {
        let committer = RecordingCommitter::new(true);
        let mut session = ChatSession::new();
        session.record_turn("add task", "Sure.", Some(task("Review docs")));

        let outcome = session.confirm("a@x.io", &committer).await.unwrap();
        assert_eq!(
            outcome,
            ConfirmOutcome::Failed {
                message: FAILED_ACK.to_string()
            }
        );
        assert!(session.pending().is_none());
        let last = session.transcript().last().unwrap();
        assert_eq!(last.text, FAILED_ACK);
        assert!(!last.text.starts_with("Done"));
    }

    #[test]
    fn test_candidate_marks_are_per_kind_and_title() {
        let mut session = ChatSession::new();
        let task_key = CandidateKey::new(ActionKind::CreateTask, "Send report");
        let meeting_key = CandidateKey::new(ActionKind::CreateMeeting, "Send report");

        assert!(session.mark_candidate_accepted(task_key.clone()));
        assert!(!session.mark_candidate_accepted(task_key.clone()));
        assert!(!session.candidate_accepted(&meeting_key));
        assert!(session.mark_candidate_accepted(meeting_key));

        session.unmark_candidate(&task_key);
        assert!(!session.candidate_accepted(&task_key));
    }
}
