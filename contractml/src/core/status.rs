//! Execution status enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate outcome of executing a contract against one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Every field validated without repair.
    Success,
    /// At least one field was repaired or dropped, none failed.
    Partial,
    /// An unrecovered field error or a record-level error occurred.
    Failed,
}

impl Default for ExecutionStatus {
    fn default() -> Self {
        Self::Success
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Partial => write!(f, "partial"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl ExecutionStatus {
    /// Returns true if the record is usable downstream.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Success | Self::Partial)
    }

    /// Returns true if the status indicates failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed)
    }
}
