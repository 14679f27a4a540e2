//! HTTP handlers, one module per resource.

pub mod chat;
pub mod health;
pub mod invites;
pub mod meetings;
pub mod streams;
pub mod summaries;
pub mod tasks;
pub mod threads;
pub mod users;

use steward_core::{clean_identities, EventActor, Meeting, ServerEvent};

use crate::identity::Identity;
use crate::state::AppState;

/// Publish a change made by `actor`.
pub(crate) fn emit(state: &AppState, actor: &Identity, event: ServerEvent) {
    state
        .event_bus
        .emit_as(event, EventActor::user(actor.as_str()));
}

/// Organizer first, then participants, without duplicates.
pub(crate) fn meeting_identities(meeting: &Meeting) -> Vec<String> {
    clean_identities(
        std::iter::once(meeting.organizer.as_str())
            .chain(meeting.participants.iter().map(String::as_str)),
    )
}

pub(crate) fn meeting_changed(meeting: &Meeting) -> ServerEvent {
    ServerEvent::MeetingChanged {
        meeting_id: meeting.id,
        identities: meeting_identities(meeting),
    }
}
