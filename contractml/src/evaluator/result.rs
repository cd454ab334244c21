//! Per-field evaluation outcome.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Classification of a field-level error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    /// A required value was absent.
    Missing,
    /// The value could not be coerced to the declared type.
    Type,
    /// A numeric value fell outside `[min, max]`.
    Range,
    /// A string value did not match the declared pattern.
    Pattern,
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::Type => write!(f, "type"),
            Self::Range => write!(f, "range"),
            Self::Pattern => write!(f, "pattern"),
        }
    }
}

/// A single validation error captured on a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Error classification.
    pub kind: FieldErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl FieldError {
    /// Creates a new field error.
    #[must_use]
    pub fn new(kind: FieldErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a missing-field error.
    #[must_use]
    pub fn missing() -> Self {
        Self::new(FieldErrorKind::Missing, "missing required field")
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Outcome of evaluating one field against its spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldResult {
    /// Final value after repair; absent when dropped or missing.
    pub value: Option<Value>,
    /// The value as supplied in the input record.
    pub original_value: Option<Value>,
    /// Whether the final value satisfies the field's rules.
    pub valid: bool,
    /// Whether a repair policy changed the value.
    pub repaired: bool,
    /// Whether the field was removed from the validated output.
    pub dropped: bool,
    /// Whether the observed value drifted from its baseline.
    pub drift_detected: bool,
    /// Errors in the order they were found.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl FieldResult {
    pub(crate) fn new(original_value: Option<Value>) -> Self {
        Self {
            value: None,
            original_value,
            valid: true,
            repaired: false,
            dropped: false,
            drift_detected: false,
            errors: Vec::new(),
        }
    }

    pub(crate) fn fail(&mut self, error: FieldError) {
        self.valid = false;
        self.errors.push(error);
    }

    pub(crate) fn drop_value(&mut self) {
        self.dropped = true;
        self.value = None;
    }

    /// Returns true when the field carries an error no repair resolved.
    #[must_use]
    pub fn is_unrecovered(&self) -> bool {
        !self.valid && !self.dropped
    }

    /// Returns true when the field contributes a value to validated output.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.valid && !self.dropped && self.value.is_some()
    }
}
