//! Transport port definition.

use async_trait::async_trait;

use crate::domain::entities::{ApiResponse, RequestDescriptor};
use crate::domain::errors::TransportError;

/// Sends one request and returns whatever the server answered.
///
/// Implementations must not interpret status codes: a 401 is a successful
/// transport call. Authentication policy is layered on top.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request as described.
    async fn send(&self, request: &RequestDescriptor) -> Result<ApiResponse, TransportError>;
}
