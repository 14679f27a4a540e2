//! Thread summaries and one-shot acceptance of suggested items.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use steward_core::{
    clean_identities, normalize, ActionCommitter, ActionKind, CandidateKey, CommittedAction,
    DateTarget, MeetingDraft, ProposedAction, ServerEvent, TaskDraft,
};
use steward_inference::{MeetingCandidate, TaskCandidate, ThreadSummary};

use super::threads::visible_thread;
use super::{emit, meeting_changed};
use crate::error::{ApiError, ApiResult};
use crate::identity::Caller;
use crate::state::AppState;

pub async fn summarize(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ThreadSummary>> {
    let thread = visible_thread(&state, &caller.identity, id).await?;
    let messages = state.db.threads.messages(id).await?;

    let summary = state
        .summarizer
        .summarize(&thread.subject, &messages, state.now())
        .await
        .map_err(|e| ApiError::upstream(e, "summarize"))?;
    Ok(Json(summary))
}

/// A summary candidate the caller wants to keep.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AcceptCandidate {
    Task {
        candidate: TaskCandidate,
    },
    Meeting {
        candidate: MeetingCandidate,
        /// Overrides the candidate's time, or supplies a missing one.
        #[serde(default)]
        time: Option<String>,
    },
}

impl AcceptCandidate {
    fn key(&self) -> CandidateKey {
        match self {
            AcceptCandidate::Task { candidate } => {
                CandidateKey::new(ActionKind::CreateTask, &candidate.title)
            }
            AcceptCandidate::Meeting { candidate, .. } => {
                CandidateKey::new(ActionKind::CreateMeeting, &candidate.title)
            }
        }
    }

    fn into_action(self, now: NaiveDateTime) -> ApiResult<ProposedAction> {
        match self {
            AcceptCandidate::Task { candidate } => Ok(ProposedAction::CreateTask {
                task: TaskDraft {
                    title: candidate.title.trim().to_string(),
                    priority: candidate.priority,
                    due_date: candidate.due_date,
                    participants: clean_identities(&candidate.participants),
                },
            }),
            AcceptCandidate::Meeting { candidate, time } => {
                let time = match time.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                    Some(expr) => normalize(expr, now, DateTarget::Meeting)
                        .map_err(|e| ApiError::BadRequest(format!("time: {}", e)))?,
                    None => candidate.time.ok_or_else(|| {
                        ApiError::BadRequest("a meeting needs a time".to_string())
                    })?,
                };
                Ok(ProposedAction::CreateMeeting {
                    meeting: MeetingDraft {
                        title: candidate.title.trim().to_string(),
                        time,
                        participants: clean_identities(&candidate.participants),
                        agenda: candidate.agenda,
                    },
                })
            }
        }
    }
}

/// Persist a summary candidate. Each (kind, title) is accepted once per session.
pub async fn accept(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<AcceptCandidate>,
) -> ApiResult<(StatusCode, Json<CommittedAction>)> {
    let key = body.key();
    if key.title.is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }
    let action = body.into_action(state.now())?;

    let session = state.sessions.get_or_create(&caller.session_key);
    let mut session = session.lock().await;
    if !session.mark_candidate_accepted(key.clone()) {
        return Err(ApiError::Conflict(format!(
            "\"{}\" was already accepted",
            key.title
        )));
    }

    let record = match state.db.commit(caller.identity.as_str(), action).await {
        Ok(record) => record,
        Err(e) => {
            session.unmark_candidate(&key);
            warn!(
                subsystem = "api",
                component = "summaries",
                action_kind = key.kind.as_str(),
                error = %e,
                "Candidate write failed"
            );
            return Err(e.into());
        }
    };
    drop(session);

    let event = match &record {
        CommittedAction::Task(task) => ServerEvent::TaskChanged {
            owner: task.owner.clone(),
            task_id: task.id,
        },
        CommittedAction::Meeting(meeting) => meeting_changed(meeting),
    };
    emit(&state, &caller.identity, event);

    info!(
        subsystem = "api",
        component = "summaries",
        action_kind = key.kind.as_str(),
        "Summary candidate accepted"
    );
    Ok((StatusCode::CREATED, Json(record)))
}
