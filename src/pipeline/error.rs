//! Structured pipeline errors.
//!
//! Handlers and guards return `Result<_, PipelineError>`; the dispatcher turns
//! every error into a failure envelope carrying the error's status code.

use axum::http::StatusCode;
use thiserror::Error;

use crate::pipeline::envelope::Envelope;

/// Errors raised by guards, middleware and handlers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// Guard rejection with an explicit status (401, 403, 408, ...).
    #[error("{message}")]
    Authorization { status: StatusCode, message: String },

    /// Bad input detected by a handler (malformed body, missing field).
    #[error("{message}")]
    Validation { status: StatusCode, message: String },

    /// Anything else. Always surfaces as 500.
    #[error("{0}")]
    Internal(String),
}

impl PipelineError {
    /// 401 with the canonical "Unauthorized" message.
    pub fn unauthorized() -> Self {
        Self::Authorization {
            status: StatusCode::UNAUTHORIZED,
            message: "Unauthorized".to_string(),
        }
    }

    /// 403 with the canonical "Forbidden" message.
    pub fn forbidden() -> Self {
        Self::Authorization {
            status: StatusCode::FORBIDDEN,
            message: "Forbidden".to_string(),
        }
    }

    pub fn authorization(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Authorization {
            status,
            message: message.into(),
        }
    }

    /// 400 validation failure.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Validation {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn validation(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Validation {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Status code sent to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Authorization { status, .. } | Self::Validation { status, .. } => *status,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to the client. Empty internal messages become "Unknown error".
    pub fn message(&self) -> &str {
        match self {
            Self::Authorization { message, .. } | Self::Validation { message, .. } => message,
            Self::Internal(message) if message.is_empty() => "Unknown error",
            Self::Internal(message) => message,
        }
    }

    /// Convert into the failure envelope the dispatcher serializes.
    pub fn into_envelope(self) -> Envelope {
        Envelope::failure(self.status(), self.message())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(_: serde_json::Error) -> Self {
        Self::bad_request("Invalid JSON body")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(PipelineError::unauthorized().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(PipelineError::forbidden().status(), StatusCode::FORBIDDEN);
        assert_eq!(PipelineError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            PipelineError::authorization(StatusCode::REQUEST_TIMEOUT, "later").status(),
            StatusCode::REQUEST_TIMEOUT
        );
        assert_eq!(
            PipelineError::internal("boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_empty_internal_message_defaults() {
        assert_eq!(PipelineError::internal("").message(), "Unknown error");
        assert_eq!(PipelineError::internal("disk full").message(), "disk full");
    }

    #[test]
    fn test_json_error_is_validation() {
        let err: PipelineError = serde_json::from_str::<serde_json::Value>("{nope")
            .unwrap_err()
            .into();
        assert_eq!(err, PipelineError::bad_request("Invalid JSON body"));
    }
}
