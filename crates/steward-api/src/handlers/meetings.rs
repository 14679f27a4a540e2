//! Meeting endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use steward_core::{clean_identities, normalize, DateTarget, Meeting, NewMeeting, ServerEvent};

use super::{emit, meeting_changed, meeting_identities};
use crate::error::{ApiError, ApiResult};
use crate::identity::Identity;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MeetingBody {
    pub title: String,
    /// Any accepted date expression; must include a time of day.
    pub time: String,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub agenda: String,
}

impl MeetingBody {
    fn into_new_meeting(self, state: &AppState, organizer: &Identity) -> ApiResult<NewMeeting> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ApiError::BadRequest("title must not be empty".to_string()));
        }
        let time = normalize(&self.time, state.now(), DateTarget::Meeting)
            .map_err(|e| ApiError::BadRequest(format!("time: {}", e)))?;

        Ok(NewMeeting {
            title: title.to_string(),
            agenda: self.agenda.trim().to_string(),
            time,
            participants: clean_identities(&self.participants),
            organizer: organizer.as_str().to_string(),
        })
    }
}

/// Upcoming meetings the caller organizes or attends.
pub async fn list_meetings(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<Vec<Meeting>>> {
    let meetings = state
        .db
        .meetings
        .list_upcoming(identity.as_str(), state.now())
        .await?;
    Ok(Json(meetings))
}

pub async fn create_meeting(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<MeetingBody>,
) -> ApiResult<(StatusCode, Json<Meeting>)> {
    let new_meeting = body.into_new_meeting(&state, &identity)?;
    let meeting = state.db.meetings.insert(new_meeting).await?;
    emit(&state, &identity, meeting_changed(&meeting));
    Ok((StatusCode::CREATED, Json(meeting)))
}

async fn organized_meeting(state: &AppState, identity: &Identity, id: Uuid) -> ApiResult<Meeting> {
    match state.db.meetings.get(id).await? {
        Some(meeting) if meeting.organizer == identity.as_str() => Ok(meeting),
        Some(_) => Err(ApiError::Forbidden(
            "only the organizer can change this meeting".to_string(),
        )),
        None => Err(ApiError::NotFound(format!("Meeting {} not found", id))),
    }
}

pub async fn update_meeting(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<MeetingBody>,
) -> ApiResult<Json<Meeting>> {
    let before = organized_meeting(&state, &identity, id).await?;
    let new_meeting = body.into_new_meeting(&state, &identity)?;
    let meeting = state.db.meetings.update(id, new_meeting).await?;

    // Removed participants must also refresh their lists.
    let identities = clean_identities(
        meeting_identities(&before)
            .into_iter()
            .chain(meeting_identities(&meeting)),
    );
    emit(
        &state,
        &identity,
        ServerEvent::MeetingChanged {
            meeting_id: id,
            identities,
        },
    );
    Ok(Json(meeting))
}

pub async fn delete_meeting(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let meeting = organized_meeting(&state, &identity, id).await?;
    state.db.meetings.delete(id).await?;
    emit(&state, &identity, meeting_changed(&meeting));
    Ok(StatusCode::NO_CONTENT)
}
