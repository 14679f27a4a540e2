//! Invitations: arranging a meeting across participants' availability.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use steward_core::{
    clean_identities, ArrangeMeeting, DayAvailability, InviteOutcome, InviteResponse,
    PendingMeeting, Resolution, ServerEvent,
};

use super::{emit, meeting_changed};
use crate::error::{ApiError, ApiResult};
use crate::identity::Identity;
use crate::state::AppState;

/// Start collecting availability for a meeting the caller organises.
pub async fn arrange(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<ArrangeMeeting>,
) -> ApiResult<(StatusCode, Json<PendingMeeting>)> {
    let pending = PendingMeeting::arrange(identity.as_str(), body)?;
    let pending = state.db.pending_meetings.insert(pending).await?;

    info!(
        subsystem = "api",
        component = "invites",
        pending_meeting_id = %pending.id,
        participant_count = pending.participants.len(),
        "Pending meeting arranged"
    );
    emit(
        &state,
        &identity,
        ServerEvent::PendingMeetingUpdated {
            pending_meeting_id: pending.id,
            remaining: pending.pending_response,
        },
    );
    Ok((StatusCode::CREATED, Json(pending)))
}

/// Invitations the caller has not answered yet.
pub async fn list_invites(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<Vec<PendingMeeting>>> {
    Ok(Json(
        state
            .db
            .pending_meetings
            .list_awaiting(identity.as_str())
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct AcceptBody {
    pub availability: DayAvailability,
}

pub async fn accept_invite(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<AcceptBody>,
) -> ApiResult<Json<InviteOutcome>> {
    respond(&state, &identity, id, InviteResponse::Accept(body.availability))
        .await
        .map(Json)
}

pub async fn reject_invite(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<InviteOutcome>> {
    respond(&state, &identity, id, InviteResponse::Reject)
        .await
        .map(Json)
}

/// Record one answer and resolve the pending meeting once nobody is left.
async fn respond(
    state: &AppState,
    identity: &Identity,
    id: Uuid,
    response: InviteResponse,
) -> ApiResult<InviteOutcome> {
    let mut pending = state
        .db
        .pending_meetings
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Invitation {} not found", id)))?;

    let stored = pending.clone();
    let expected = pending.pending_response;
    pending.respond(identity.as_str(), response)?;
    // Concurrent answers race on the stored count; the loser gets 409.
    state.db.pending_meetings.save(&pending, expected).await?;

    if !pending.is_complete() {
        emit(
            state,
            identity,
            ServerEvent::PendingMeetingUpdated {
                pending_meeting_id: id,
                remaining: pending.pending_response,
            },
        );
        return Ok(InviteOutcome::Pending {
            remaining: pending.pending_response,
        });
    }

    let outcome = match pending.resolve() {
        Resolution::Scheduled { meeting, .. } => {
            let meeting = match state.db.meetings.insert(meeting).await {
                Ok(meeting) => meeting,
                Err(e) => {
                    restore(state, &stored).await;
                    return Err(e.into());
                }
            };
            emit(state, identity, meeting_changed(&meeting));
            InviteOutcome::Scheduled { meeting }
        }
        Resolution::NoCommonSlot => InviteOutcome::NoCommonSlot,
        Resolution::AllDeclined => InviteOutcome::AllDeclined,
    };
    state.db.pending_meetings.delete(id).await?;

    info!(
        subsystem = "api",
        component = "invites",
        pending_meeting_id = %id,
        outcome = outcome.as_str(),
        "Pending meeting resolved"
    );
    emit(
        state,
        identity,
        ServerEvent::PendingMeetingResolved {
            pending_meeting_id: id,
            outcome: outcome.as_str().to_string(),
            identities: clean_identities(
                std::iter::once(pending.organiser.as_str())
                    .chain(pending.participants.iter().map(String::as_str)),
            ),
        },
    );
    Ok(outcome)
}

/// Put back the pending meeting as it was before the final answer, so the
/// last responder can answer again.
async fn restore(state: &AppState, stored: &PendingMeeting) {
    if let Err(e) = state.db.pending_meetings.save(stored, 0).await {
        error!(
            subsystem = "api",
            component = "invites",
            pending_meeting_id = %stored.id,
            error = %e,
            "Failed to restore pending meeting"
        );
    }
}
