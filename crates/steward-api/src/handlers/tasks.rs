//! Task endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use steward_core::{
    clean_identities, normalize, DateTarget, NewTask, Priority, ServerEvent, Task,
};

use super::emit;
use crate::error::{ApiError, ApiResult};
use crate::identity::Identity;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskBody {
    pub title: String,
    #[serde(default)]
    pub priority: Option<String>,
    /// Required. Any accepted date expression; normalized as a task date.
    #[serde(default, alias = "due_date")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub participants: Vec<String>,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(state.db.tasks.list_for_owner(identity.as_str()).await?))
}

pub async fn create_task(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<CreateTaskBody>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let title = body.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }

    let expr = body
        .due_date
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("dueDate is required".to_string()))?;
    let due_date = normalize(expr, state.now(), DateTarget::Task)
        .map_err(|e| ApiError::BadRequest(format!("dueDate: {}", e)))?;

    let task = state
        .db
        .tasks
        .insert(NewTask {
            title: title.to_string(),
            priority: Priority::coerce(body.priority.as_deref()),
            due_date: Some(due_date),
            owner: identity.as_str().to_string(),
            participants: clean_identities(&body.participants),
        })
        .await?;

    emit(
        &state,
        &identity,
        ServerEvent::TaskChanged {
            owner: task.owner.clone(),
            task_id: task.id,
        },
    );
    Ok((StatusCode::CREATED, Json(task)))
}

/// Load a task the caller owns.
async fn owned_task(state: &AppState, identity: &Identity, id: Uuid) -> ApiResult<Task> {
    match state.db.tasks.get(id).await? {
        Some(task) if task.owner == identity.as_str() => Ok(task),
        Some(_) => Err(ApiError::Forbidden(
            "only the owner can change this task".to_string(),
        )),
        None => Err(ApiError::NotFound(format!("Task {} not found", id))),
    }
}

pub async fn toggle_task(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    owned_task(&state, &identity, id).await?;
    let task = state.db.tasks.toggle(id).await?;
    emit(
        &state,
        &identity,
        ServerEvent::TaskChanged {
            owner: task.owner.clone(),
            task_id: task.id,
        },
    );
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let task = owned_task(&state, &identity, id).await?;
    state.db.tasks.delete(id).await?;
    emit(
        &state,
        &identity,
        ServerEvent::TaskChanged {
            owner: task.owner,
            task_id: id,
        },
    );
    Ok(StatusCode::NO_CONTENT)
}
