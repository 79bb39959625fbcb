//! API request error types.

use serde_json::Value;
use thiserror::Error;

use super::{FieldErrors, StorageError, TransportError};

/// Every failure a request to the tracking API can end in.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ApiError {
    #[error("request failed with HTTP {status}")]
    Http { status: u16, payload: Option<Value> },

    #[error("network error: {message}")]
    Network { message: String },

    /// Refresh token rejected or missing. Stored credentials are already cleared.
    #[error("session ended, please log in again")]
    SessionEnded { status: Option<u16> },

    /// Refresh endpoint unreachable or failing. Stored credentials are untouched.
    #[error("token refresh failed temporarily: {message}")]
    RefreshFailed { status: Option<u16>, message: String },

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("validation failed: {0}")]
    Validation(#[from] FieldErrors),

    #[error("failed to decode response: {message}")]
    Decode { message: String },

    #[error("credential storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("unexpected error: {message}")]
    Unexpected { message: String },
}

impl ApiError {
    /// Creates an HTTP status error.
    #[must_use]
    pub fn http(status: u16, payload: Value) -> Self {
        let payload = if payload.is_null() { None } else { Some(payload) };
        Self::Http { status, payload }
    }

    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates unexpected error.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Returns the HTTP status that caused this error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::SessionEnded { status } | Self::RefreshFailed { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns the backend payload, if any.
    #[must_use]
    pub const fn payload(&self) -> Option<&Value> {
        match self {
            Self::Http { payload, .. } => payload.as_ref(),
            _ => None,
        }
    }

    /// Returns the backend `detail` message, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.payload()
            .and_then(|payload| payload.get("detail"))
            .and_then(Value::as_str)
    }

    /// Returns whether the user must log in again.
    #[must_use]
    pub const fn is_session_ended(&self) -> bool {
        matches!(self, Self::SessionEnded { .. })
    }

    /// Returns whether the same action may succeed if tried again later.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::RefreshFailed { .. } => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns whether this is a plain 401 response.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status: 401, .. })
    }
}

impl From<TransportError> for ApiError {
    fn from(error: TransportError) -> Self {
        Self::network(error.to_string())
    }
}
