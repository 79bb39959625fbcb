//! Domain layer with core entities, errors, ports and validation.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;
/// Serde utilities.
pub mod serde_utils;
/// Domain services.
pub mod services;

pub use entities::{AccessToken, RefreshToken, RequestDescriptor, SessionCredentials, UserProfile};
pub use errors::{ApiError, FieldErrors, StorageError, TransportError};
pub use ports::{AuthPort, KeyValueStorePort, Transport};
