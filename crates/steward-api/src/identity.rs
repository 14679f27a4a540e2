//! Caller identity and session key extractors.
//!
//! Authentication happens upstream; the authenticated email arrives in
//! `x-user-email`. Chat state is keyed by `x-session-id`, defaulting to the
//! identity so one user without a session header shares one conversation.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;

pub const USER_HEADER: &str = "x-user-email";
pub const SESSION_HEADER: &str = "x-session-id";

/// The authenticated caller's email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub String);

impl Identity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_value(parts, USER_HEADER)
            .map(Identity)
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {} header", USER_HEADER)))
    }
}

/// Identity plus the chat session it is talking in.
#[derive(Debug, Clone)]
pub struct Caller {
    pub identity: Identity,
    pub session_key: String,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = Identity::from_request_parts(parts, state).await?;
        // Namespaced so one user cannot address another user's session.
        let session = header_value(parts, SESSION_HEADER).unwrap_or_default();
        Ok(Caller {
            session_key: format!("{}#{}", identity.as_str(), session),
            identity,
        })
    }
}
