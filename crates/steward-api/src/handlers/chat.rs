//! Chat turns and the confirmation workflow.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use steward_core::{
    CommittedAction, ConfirmOutcome, ConfirmationState, ProposedAction, ServerEvent,
    TranscriptEntry,
};

use super::{emit, meeting_changed};
use crate::error::{ApiError, ApiResult};
use crate::identity::Caller;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ProposedAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_prompt: Option<String>,
}

/// Run one chat turn. A valid proposal replaces any outstanding one.
pub async fn chat(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<ChatBody>,
) -> ApiResult<Json<ChatResponse>> {
    let message = body.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }

    let parsed = state
        .extractor
        .extract(message, caller.identity.as_str(), state.now())
        .await
        .map_err(|e| ApiError::upstream(e, "chat"))?;

    let session = state.sessions.get_or_create(&caller.session_key);
    let confirmation_prompt =
        session
            .lock()
            .await
            .record_turn(message, &parsed.reply, parsed.action.clone());

    info!(
        subsystem = "api",
        component = "chat",
        identity = caller.identity.as_str(),
        action_kind = parsed.action.as_ref().map(|a| a.kind().as_str()).unwrap_or("none"),
        "Chat turn handled"
    );

    Ok(Json(ChatResponse {
        reply: parsed.reply,
        action: parsed.action,
        confirmation_prompt,
    }))
}

/// Commit the outstanding proposal.
pub async fn confirm(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<ConfirmOutcome>> {
    let session = state.sessions.get_or_create(&caller.session_key);
    let outcome = session
        .lock()
        .await
        .confirm(caller.identity.as_str(), &state.db)
        .await?;

    if let ConfirmOutcome::Committed { record, .. } = &outcome {
        let event = match record {
            CommittedAction::Task(task) => ServerEvent::TaskChanged {
                owner: task.owner.clone(),
                task_id: task.id,
            },
            CommittedAction::Meeting(meeting) => meeting_changed(meeting),
        };
        emit(&state, &caller.identity, event);
    }
    Ok(Json(outcome))
}

#[derive(Debug, Serialize)]
pub struct RejectResponse {
    pub message: String,
}

/// Discard the outstanding proposal.
pub async fn reject(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<RejectResponse>> {
    let session = state.sessions.get_or_create(&caller.session_key);
    let message = session.lock().await.reject()?;
    Ok(Json(RejectResponse { message }))
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub transcript: Vec<TranscriptEntry>,
    pub state: ConfirmationState,
}

pub async fn transcript(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<TranscriptResponse>> {
    let session = state.sessions.get_or_create(&caller.session_key);
    let session = session.lock().await;
    Ok(Json(TranscriptResponse {
        transcript: session.transcript().to_vec(),
        state: session.state().clone(),
    }))
}
