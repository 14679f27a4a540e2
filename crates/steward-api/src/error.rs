//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Body returned when the completion service fails. The cause is logged,
/// never echoed.
pub const ASSISTANT_UNAVAILABLE: &str =
    "The assistant could not process that right now. Please try again.";

#[derive(Debug)]
pub enum ApiError {
    Internal(steward_core::Error),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    /// The completion service failed or is misconfigured.
    Upstream,
}

impl From<steward_core::Error> for ApiError {
    fn from(err: steward_core::Error) -> Self {
        use steward_core::Error;
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            other => ApiError::Internal(other),
        }
    }
}

impl ApiError {
    /// Map a completion failure: log the cause, return a generic 502.
    pub fn upstream(err: steward_core::Error, op: &'static str) -> Self {
        tracing::error!(
            subsystem = "api",
            op,
            error = %err,
            "Completion service call failed"
        );
        ApiError::Upstream
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Internal(err) => {
                tracing::error!(subsystem = "api", error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Upstream => (StatusCode::BAD_GATEWAY, ASSISTANT_UNAVAILABLE.to_string()),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        let cases = [
            (steward_core::Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (steward_core::Error::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (steward_core::Error::Conflict("x".into()), StatusCode::CONFLICT),
            (steward_core::Error::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (steward_core::Error::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_upstream_is_bad_gateway() {
        let err = ApiError::upstream(steward_core::Error::Inference("boom".into()), "chat");
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
