//! Transport error types.

use thiserror::Error;

/// Failures that produce no HTTP response at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum TransportError {
    #[error("request timed out: {message}")]
    Timeout { message: String },

    #[error("failed to connect: {message}")]
    Connect { message: String },

    #[error("request error: {message}")]
    Request { message: String },
}

impl TransportError {
    /// Creates timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Creates connection error.
    #[must_use]
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
        }
    }

    /// Creates generic request error.
    #[must_use]
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
        }
    }
}
