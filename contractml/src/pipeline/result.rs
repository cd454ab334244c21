//! Execution result types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use super::Predictions;
use crate::core::{ExecutionStatus, Record};
use crate::evaluator::FieldResult;

/// Classification of a record-level error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionErrorKind {
    /// The record carries a key a strict contract does not declare.
    UnknownField,
    /// The inference collaborator failed or is not configured.
    InferenceUnavailable,
    /// The inference collaborator exceeded its time bound.
    PipelineTimeout,
}

impl fmt::Display for ExecutionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownField => write!(f, "unknown_field"),
            Self::InferenceUnavailable => write!(f, "inference_unavailable"),
            Self::PipelineTimeout => write!(f, "pipeline_timeout"),
        }
    }
}

/// A record-level error captured on the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionError {
    /// Error classification.
    pub kind: ExecutionErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Field the error refers to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ExecutionError {
    /// Creates an unknown-field error.
    #[must_use]
    pub fn unknown_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            kind: ExecutionErrorKind::UnknownField,
            message: format!("field '{field}' is not declared by the contract"),
            field: Some(field),
        }
    }

    /// Creates an inference-unavailable error.
    #[must_use]
    pub fn inference_unavailable(reason: impl Into<String>) -> Self {
        Self {
            kind: ExecutionErrorKind::InferenceUnavailable,
            message: reason.into(),
            field: None,
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(bound: Duration) -> Self {
        Self {
            kind: ExecutionErrorKind::PipelineTimeout,
            message: format!("inference exceeded {}ms", bound.as_millis()),
            field: None,
        }
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Outcome of executing one record against one contract.
///
/// Created fresh per call and owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Contract domain.
    pub domain: String,
    /// Contract version.
    pub version: String,
    /// Final values of valid, non-dropped fields.
    pub validated_data: Record,
    /// Per-field outcomes keyed by field name.
    pub field_results: BTreeMap<String, FieldResult>,
    /// Model outputs; absent without a binding or when execution failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictions: Option<Predictions>,
    /// Whether any field drifted.
    pub drift_detected: bool,
    /// Aggregate status.
    pub status: ExecutionStatus,
    /// Record-level errors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ExecutionError>,
    /// Source version when the record was migrated from an older contract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrated_from: Option<String>,
}

impl ExecutionResult {
    /// Returns the outcome for a field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldResult> {
        self.field_results.get(name)
    }

    /// Names of fields whose values drifted.
    #[must_use]
    pub fn drifted_fields(&self) -> Vec<&str> {
        self.fields_where(|r| r.drift_detected)
    }

    /// Names of fields a repair policy changed.
    #[must_use]
    pub fn repaired_fields(&self) -> Vec<&str> {
        self.fields_where(|r| r.repaired)
    }

    /// Names of fields removed from the validated output.
    #[must_use]
    pub fn dropped_fields(&self) -> Vec<&str> {
        self.fields_where(|r| r.dropped)
    }

    /// Names of fields with unrecovered errors.
    #[must_use]
    pub fn failed_fields(&self) -> Vec<&str> {
        self.fields_where(FieldResult::is_unrecovered)
    }

    fn fields_where(&self, predicate: impl Fn(&FieldResult) -> bool) -> Vec<&str> {
        self.field_results
            .iter()
            .filter(|(_, result)| predicate(result))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
