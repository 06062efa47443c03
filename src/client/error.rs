//! Error types for the message client.

use thiserror::Error;

use crate::config::ConfigError;

/// Message shown when the backend cannot be reached at all.
pub const UNREACHABLE_MESSAGE: &str =
    "Unable to connect to the server. Please check your connection and ensure the backend is running.";

/// Errors that can occur while exchanging a message with the backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (connection refused, DNS failure).
    #[error("{}", UNREACHABLE_MESSAGE)]
    Unreachable(#[source] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the body, or the status line.
        message: String,
    },

    /// The success body could not be read or parsed as a reply.
    #[error("Invalid reply from server: {0}")]
    MalformedReply(String),

    /// HTTP client configuration error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Endpoint configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Whether the failure happened before any response was received.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }

    /// HTTP status of the response, if one was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(value: serde_json::Error) -> Self {
        Self::MalformedReply(value.to_string())
    }
}
