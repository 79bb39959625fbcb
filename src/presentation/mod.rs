//! Presentation layer: command execution and terminal output.

/// Command runner.
pub mod commands;

pub use commands::{CommandError, CommandRunner};
