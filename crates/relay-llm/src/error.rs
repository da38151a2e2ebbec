use http::StatusCode;
use relay_auth::AuthError;
use relay_core::HttpError;
use thiserror::Error;

/// Message returned to clients after a rejected token has been refreshed
pub const TOKEN_REFRESHED_MESSAGE: &str = "token refreshed, please retry";

/// Errors that can occur while translating or forwarding a request
#[derive(Debug, Error)]
pub enum LlmError {
    /// Backend rejected the translated request as malformed
    #[error("invalid request: {detail}")]
    InvalidRequest { detail: String },

    /// Transport failure, timeout, or unexpected status from the backend
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Backend returned 403; the token has been refreshed
    #[error("{TOKEN_REFRESHED_MESSAGE}")]
    BackendAuthExpired,

    /// Access token could not be read
    #[error("token error: {0}")]
    Token(#[from] AuthError),

    /// Client sent a body that is not a valid request
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HttpError for LlmError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest { .. } | Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::BackendUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::BackendAuthExpired => StatusCode::SERVICE_UNAVAILABLE,
            Self::Token(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::InvalidRequest { .. } | Self::MalformedBody(_) => "invalid_request_error",
            Self::BackendUnavailable(_) => "overloaded_error",
            Self::BackendAuthExpired => "authentication_error",
            Self::Token(_) | Self::Internal(_) => "api_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "an internal error occurred".to_owned(),
            other => other.to_string(),
        }
    }
}
