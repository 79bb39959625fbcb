use super::app_config::{CredentialBackend, LogLevel};
use crate::domain::entities::{AssociationType, RecordStatus};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "batchtrack",
    version,
    about = "Command-line client for the batch tracking API",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the tracking API.
    #[arg(long, env = "TRACKER_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Where session credentials are stored.
    #[arg(long, value_enum)]
    pub credential_backend: Option<CredentialBackend>,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the session.
    Login {
        /// Account name.
        username: String,

        /// Account password.
        #[arg(long, env = "BATCHTRACK_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Keep the session after the login session ends.
        #[arg(long)]
        remember: bool,
    },
    /// Forget the stored session.
    Logout,
    /// Show the logged-in user.
    Whoami,
    /// Exchange the refresh token for a new access token.
    Refresh,
    /// Manage batches.
    Batches {
        #[command(subcommand)]
        action: RecordCommand,
    },
    /// Manage bags.
    Bags {
        #[command(subcommand)]
        action: RecordCommand,
    },
    /// Manage forms.
    Forms {
        #[command(subcommand)]
        action: ResourceCommand,
    },
    /// Manage form fields.
    FormFields {
        #[command(subcommand)]
        action: ResourceCommand,
    },
    /// Manage form submissions.
    Submissions {
        #[command(subcommand)]
        action: SubmissionCommand,
    },
}

/// Operations on a single record. `JSON` is inline JSON or `@path`.
#[derive(Debug, Clone, Subcommand)]
pub enum ItemCommand {
    /// Show one record.
    Get { id: u64 },
    /// Create a record.
    Create {
        #[arg(value_name = "JSON")]
        json: String,
    },
    /// Replace a record.
    Update {
        id: u64,
        #[arg(value_name = "JSON")]
        json: String,
    },
    /// Change selected attributes of a record.
    Patch {
        id: u64,
        #[arg(value_name = "JSON")]
        json: String,
    },
    /// Delete a record.
    Delete { id: u64 },
}

/// Commands for forms and form fields.
#[derive(Debug, Clone, Subcommand)]
pub enum ResourceCommand {
    /// List all records.
    List,
    #[command(flatten)]
    Item(ItemCommand),
}

/// Commands for batches and bags.
#[derive(Debug, Clone, Subcommand)]
pub enum RecordCommand {
    /// List all records.
    List,
    /// Move a record to another workflow status.
    SetStatus {
        id: u64,
        #[arg(value_parser = parse_status)]
        status: RecordStatus,
    },
    #[command(flatten)]
    Item(ItemCommand),
}

/// Commands for submissions.
#[derive(Debug, Clone, Subcommand)]
pub enum SubmissionCommand {
    /// List submissions.
    List {
        /// Only submissions of this form.
        #[arg(long)]
        form: Option<u64>,

        /// Only submissions of forms with this association.
        #[arg(long, value_parser = parse_association)]
        association_type: Option<AssociationType>,
    },
    #[command(flatten)]
    Item(ItemCommand),
}

fn parse_status(value: &str) -> Result<RecordStatus, String> {
    value.parse()
}

fn parse_association(value: &str) -> Result<AssociationType, String> {
    value.parse()
}
