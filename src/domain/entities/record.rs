//! Shared record attributes.

use serde::{Deserialize, Serialize};

use super::credentials::UserProfile;

/// Workflow status of batches and bags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Draft,
    Working,
    Completed,
}

impl RecordStatus {
    /// Returns whether the user may modify a record in this status.
    ///
    /// Completed records are read-only for everyone except staff.
    #[must_use]
    pub fn is_editable_by(self, profile: Option<&UserProfile>) -> bool {
        match profile {
            None => false,
            Some(profile) => profile.is_staff() || self != Self::Completed,
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Working => write!(f, "working"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "working" => Ok(Self::Working),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// Which record kind a form attaches to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssociationType {
    Batch,
    Bag,
    #[default]
    Standalone,
}

impl AssociationType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Batch => "batch",
            Self::Bag => "bag",
            Self::Standalone => "standalone",
        }
    }
}

impl std::fmt::Display for AssociationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssociationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batch" => Ok(Self::Batch),
            "bag" => Ok(Self::Bag),
            "standalone" => Ok(Self::Standalone),
            other => Err(format!("unknown association type: {other}")),
        }
    }
}
