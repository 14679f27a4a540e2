//! # steward-api
//!
//! HTTP service for the steward assistant: chat with confirmation, tasks,
//! meetings, invitations, threads with summaries, and snapshot streams.

pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod sessions;
pub mod state;

use std::time::Duration;

use axum::http::{header, HeaderName, Method};
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use handlers::{chat, health, invites, meetings, streams, summaries, tasks, threads, users};

pub use config::{ServerConfig, StorageConfig};
pub use error::{ApiError, ApiResult};
pub use state::{AppState, Clock};

/// Request bodies are small JSON documents.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Build the application router with all routes and middleware.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        // Chat and confirmation
        .route("/api/v1/chat", post(chat::chat))
        .route("/api/v1/chat/confirm", post(chat::confirm))
        .route("/api/v1/chat/reject", post(chat::reject))
        .route("/api/v1/chat/transcript", get(chat::transcript))
        // Tasks
        .route("/api/v1/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route("/api/v1/tasks/:id", delete(tasks::delete_task))
        .route("/api/v1/tasks/:id/toggle", post(tasks::toggle_task))
        // Meetings
        .route(
            "/api/v1/meetings",
            get(meetings::list_meetings).post(meetings::create_meeting),
        )
        .route("/api/v1/meetings/stream", get(streams::meetings_stream))
        .route(
            "/api/v1/meetings/:id",
            put(meetings::update_meeting).delete(meetings::delete_meeting),
        )
        // Invitations
        .route("/api/v1/pending-meetings", post(invites::arrange))
        .route("/api/v1/invites", get(invites::list_invites))
        .route("/api/v1/invites/:id/accept", post(invites::accept_invite))
        .route("/api/v1/invites/:id/reject", post(invites::reject_invite))
        // Threads
        .route(
            "/api/v1/threads",
            get(threads::list_threads).post(threads::compose),
        )
        .route(
            "/api/v1/threads/:id/messages",
            get(threads::list_messages).post(threads::post_message),
        )
        .route(
            "/api/v1/threads/:id/messages/stream",
            get(streams::messages_stream),
        )
        .route("/api/v1/threads/:id/summarize", post(summaries::summarize))
        .route("/api/v1/summaries/accept", post(summaries::accept))
        // Users
        .route("/api/v1/users", get(users::search_users))
        .route("/api/v1/users/me", put(users::upsert_me))
        // Middleware
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(config.allowed_origins.clone()))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                    HeaderName::from_static(identity::USER_HEADER),
                    HeaderName::from_static(identity::SESSION_HEADER),
                ])
                .allow_credentials(true)
                .max_age(Duration::from_secs(3600)),
        )
        .layer(CatchPanicLayer::new())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}
