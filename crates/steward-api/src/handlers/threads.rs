//! Threads and messages.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use steward_core::{Message, NewThread, ServerEvent, Thread};

use super::emit;
use crate::error::{ApiError, ApiResult};
use crate::identity::Identity;
use crate::state::AppState;

/// Load a thread the caller participates in.
pub(crate) async fn visible_thread(
    state: &AppState,
    identity: &Identity,
    id: Uuid,
) -> ApiResult<Thread> {
    match state.db.threads.get(id).await? {
        Some(thread) if thread.includes(identity.as_str()) => Ok(thread),
        Some(_) => Err(ApiError::Forbidden(
            "not a participant of this thread".to_string(),
        )),
        None => Err(ApiError::NotFound(format!("Thread {} not found", id))),
    }
}

pub async fn list_threads(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<Vec<Thread>>> {
    Ok(Json(state.db.threads.list_for(identity.as_str()).await?))
}

#[derive(Debug, Deserialize)]
pub struct ComposeBody {
    pub subject: String,
    #[serde(default)]
    pub participants: Vec<String>,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ComposeResponse {
    pub thread: Thread,
    pub message: Message,
}

/// Start a thread. The sender always joins it.
pub async fn compose(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<ComposeBody>,
) -> ApiResult<(StatusCode, Json<ComposeResponse>)> {
    let subject = body.subject.trim();
    if subject.is_empty() {
        return Err(ApiError::BadRequest("subject must not be empty".to_string()));
    }
    if body.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".to_string()));
    }

    let (thread, message) = state
        .db
        .threads
        .create(NewThread {
            subject: subject.to_string(),
            sender: identity.as_str().to_string(),
            participants: body.participants,
            text: body.text,
        })
        .await?;

    emit(
        &state,
        &identity,
        ServerEvent::ThreadCreated {
            thread_id: thread.id,
            participants: thread.participants.clone(),
        },
    );
    Ok((StatusCode::CREATED, Json(ComposeResponse { thread, message })))
}

pub async fn list_messages(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Message>>> {
    visible_thread(&state, &identity, id).await?;
    Ok(Json(state.db.threads.messages(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct PostBody {
    pub text: String,
}

pub async fn post_message(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<PostBody>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    visible_thread(&state, &identity, id).await?;
    if body.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".to_string()));
    }

    let message = state
        .db
        .threads
        .post_message(id, identity.as_str(), &body.text)
        .await?;
    emit(
        &state,
        &identity,
        ServerEvent::MessagePosted {
            thread_id: id,
            message_id: message.id,
        },
    );
    Ok((StatusCode::CREATED, Json(message)))
}
