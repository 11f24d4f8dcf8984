// Error types for the console's client layer.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for console operations.
pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Everything a console operation can surface to the presentation layer.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Credentials were rejected at login, or a registration was refused.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A bearer-gated call was attempted without a token.
    #[error("authentication required")]
    AuthRequired,

    #[error("request failed with status {status}: {message}")]
    Request { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("credential storage error: {0}")]
    Storage(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ConsoleError {
    /// True for a server response that rejected the bearer token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ConsoleError::Request { status, .. } if *status == StatusCode::UNAUTHORIZED.as_u16())
    }

    /// HTTP status carried by a `Request` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ConsoleError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}
