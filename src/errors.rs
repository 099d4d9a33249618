use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;
use tracing::warn;

/// Failures raised below the stores.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend responded with {status}")]
    Status {
        status: StatusCode,
        message: Option<String>,
    },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("stored session is missing its {missing} record")]
    IncompleteSession { missing: &'static str },
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Message the backend attached to an error response, if any.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } => Some(message),
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// Failure result of a store operation, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionError {
    pub message: String,
    pub status: Option<StatusCode>,
}

impl ActionError {
    /// Prefers the backend's message, then a validation message, then `fallback`.
    pub fn from_client(err: &ClientError, fallback: &str) -> Self {
        let message = match err {
            ClientError::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            ClientError::Validation(message) => message.clone(),
            _ => fallback.to_owned(),
        };

        Self {
            message,
            status: err.status(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(StatusCode::UNAUTHORIZED)
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ActionError {}

/// Logs `err` against `operation` and converts it for the caller.
pub(crate) fn report(operation: &str, err: &ClientError, fallback: &str) -> ActionError {
    warn!(operation, error = %err, "{operation} failed");
    ActionError::from_client(err, fallback)
}
