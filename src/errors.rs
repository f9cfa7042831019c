//! Error types for ChainPulse

use thiserror::Error;

/// Main error type for ChainPulse
#[derive(Error, Debug)]
pub enum ChainpulseError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A user-editable field did not hold the JSON it must hold.
    #[error("Invalid {field}: {message}")]
    Validation {
        field: String,
        message: String,
    },

    /// The backend answered with a success status but reported an `error` in the body.
    #[error("{0}")]
    Application(String),

    /// The backend answered with a non-2xx HTTP status.
    #[error("HTTP {status} {reason}")]
    Transport {
        status: u16,
        reason: String,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Timeout after {0:.1} seconds")]
    Timeout(f64),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Chain error: {0}")]
    Chain(String),
}

impl ChainpulseError {
    /// Whether the failure happened below the application layer
    /// (HTTP status, connection, timeout) rather than in the backend's answer.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ChainpulseError::Transport { .. }
                | ChainpulseError::Request(_)
                | ChainpulseError::Timeout(_)
                | ChainpulseError::MalformedResponse(_)
        )
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ChainpulseError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChainpulseError>;
