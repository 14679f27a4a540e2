//! Mapping of completion provider failures onto steward errors.
//!
//! Both providers report failures as a non-2xx status plus a JSON body with
//! an error type and message. No status is retried.

use steward_core::Error;

/// Provider error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorCode {
    /// Invalid authentication credentials.
    AuthenticationError,
    /// Key is valid but not allowed to use the model.
    PermissionDenied,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Model not found or not available.
    ModelNotFound,
    /// Request too large.
    ContextLengthExceeded,
    /// Provider is overloaded or failing.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl ProviderErrorCode {
    /// Determine error code from HTTP status and error type.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401, _) | (_, "authentication_error") => Self::AuthenticationError,
            (403, _) | (_, "permission_error") => Self::PermissionDenied,
            (429, _) => Self::RateLimitExceeded,
            (404, _) | (_, "model_not_found") | (_, "not_found_error") => Self::ModelNotFound,
            (400, _) if error_type.contains("context_length") => Self::ContextLengthExceeded,
            (500..=599, _) | (_, "overloaded_error") => Self::ServerError,
            _ => Self::Unknown,
        }
    }
}

/// Convert a provider failure into a steward Error.
///
/// Credential and model problems are configuration errors; everything else is
/// an inference error.
pub fn to_steward_error(provider: &str, code: ProviderErrorCode, message: &str) -> Error {
    match code {
        ProviderErrorCode::AuthenticationError => {
            Error::Config(format!("{} authentication failed: {}", provider, message))
        }
        ProviderErrorCode::PermissionDenied => {
            Error::Config(format!("{} permission denied: {}", provider, message))
        }
        ProviderErrorCode::ModelNotFound => {
            Error::Config(format!("{} model not found: {}", provider, message))
        }
        ProviderErrorCode::RateLimitExceeded => {
            Error::Inference(format!("{} rate limit exceeded: {}", provider, message))
        }
        ProviderErrorCode::ContextLengthExceeded => {
            Error::Inference(format!("{} context too long: {}", provider, message))
        }
        ProviderErrorCode::ServerError => {
            Error::Inference(format!("{} server error: {}", provider, message))
        }
        ProviderErrorCode::Unknown => Error::Inference(format!("{}: {}", provider, message)),
    }
}
