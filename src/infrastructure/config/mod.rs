//! Application configuration.

pub mod app_config;
pub mod args;
pub mod storage;

pub use app_config::{AppConfig, CredentialBackend, LogLevel};
pub use args::{CliArgs, Command, ItemCommand, RecordCommand, ResourceCommand, SubmissionCommand};
pub use storage::{ConfigError, StorageManager};
