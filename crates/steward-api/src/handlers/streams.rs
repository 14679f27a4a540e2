//! Server-sent snapshot streams.
//!
//! Each stream sends the full current list on connect and again after every
//! relevant change notification. Clients replace their copy wholesale. A
//! lagged receiver is treated as a change, so a slow client resynchronizes on
//! the next snapshot instead of silently missing updates.
//!
//! The meeting stream also carries an `invitation` event when a pending
//! meeting the caller organised or was invited to is resolved, since an
//! unscheduled outcome leaves no trace in the snapshot.

use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive};
use axum::response::Sse;
use futures::stream::{self, Stream, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};
use uuid::Uuid;

use steward_core::{EventEnvelope, ServerEvent};

use super::threads::visible_thread;
use crate::error::ApiResult;
use crate::identity::Identity;
use crate::state::AppState;

const SNAPSHOT_EVENT: &str = "snapshot";
const INVITATION_EVENT: &str = "invitation";
const KEEPALIVE_SECS: u64 = 15;

/// Snapshot stream; `notice` may turn a relevant change into its own event,
/// sent just before the snapshot it triggers.
fn snapshot_stream<T, R, N, F, Fut>(
    rx: broadcast::Receiver<EventEnvelope>,
    relevant: R,
    notice: N,
    load: F,
) -> impl Stream<Item = Result<Event, Infallible>>
where
    T: Serialize + Send + 'static,
    R: Fn(&ServerEvent) -> bool + Send + 'static,
    N: Fn(&ServerEvent) -> Option<Event> + Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = steward_core::Result<T>> + Send + 'static,
{
    let changes = BroadcastStream::new(rx).filter_map(move |item| {
        let trigger = match item {
            Ok(envelope) => relevant(&envelope.payload).then(|| notice(&envelope.payload)),
            Err(_) => Some(None),
        };
        futures::future::ready(trigger)
    });

    stream::once(futures::future::ready(None))
        .chain(changes)
        .then(move |notice| {
            let snapshot = load();
            async move { (notice, snapshot.await) }
        })
        .flat_map(|(notice, snapshot)| {
            let snapshot = match snapshot {
                Ok(snapshot) => serde_json::to_string(&snapshot)
                    .ok()
                    .map(|json| Event::default().event(SNAPSHOT_EVENT).data(json)),
                Err(e) => {
                    warn!(subsystem = "api", component = "streams", error = %e, "Snapshot query failed");
                    None
                }
            };
            stream::iter(notice.into_iter().chain(snapshot).map(Ok))
        })
}

/// How a pending meeting ended, for everyone it involved.
fn invitation_outcome(event: &ServerEvent) -> Option<Event> {
    match event {
        ServerEvent::PendingMeetingResolved {
            pending_meeting_id,
            outcome,
            ..
        } => {
            let data = serde_json::json!({
                "pendingMeetingId": pending_meeting_id,
                "outcome": outcome,
            });
            Some(Event::default().event(INVITATION_EVENT).data(data.to_string()))
        }
        _ => None,
    }
}

fn keep_alive() -> KeepAlive {
    KeepAlive::new()
        .interval(Duration::from_secs(KEEPALIVE_SECS))
        .text("keepalive")
}

/// Upcoming meetings of the caller, plus invitation outcomes.
pub async fn meetings_stream(
    State(state): State<AppState>,
    identity: Identity,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.event_bus.subscribe();
    debug!(subsystem = "api", component = "streams", identity = identity.as_str(), "Meeting stream opened");

    let who = identity.as_str().to_string();
    let load = move || {
        let state = state.clone();
        let who = identity.as_str().to_string();
        async move { state.db.meetings.list_upcoming(&who, state.now()).await }
    };
    let stream = snapshot_stream(
        rx,
        move |event| event.touches_meetings_of(&who),
        invitation_outcome,
        load,
    );
    Sse::new(stream).keep_alive(keep_alive())
}

/// Messages of one thread the caller participates in.
pub async fn messages_stream(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    visible_thread(&state, &identity, id).await?;
    let rx = state.event_bus.subscribe();

    let load = move || {
        let state = state.clone();
        async move { state.db.threads.messages(id).await }
    };
    let stream = snapshot_stream(rx, move |event| event.touches_thread(id), |_| None, load);
    Ok(Sse::new(stream).keep_alive(keep_alive()))
}
