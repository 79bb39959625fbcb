//! Infrastructure layer with external service adapters.

/// Typed tracking API resources.
pub mod api;
/// Application configuration.
pub mod config;
/// HTTP transport and authenticated client.
pub mod http;
/// Credential storage adapters.
pub mod storage;

pub use api::{ResourceApi, TrackerApi};
pub use config::{AppConfig, CliArgs, CredentialBackend, LogLevel, StorageManager};
pub use http::{AuthenticatedClient, ReqwestTransport, TokenApi};
pub use storage::{FileKeyValueStore, KeyringKeyValueStore, MemoryKeyValueStore};
