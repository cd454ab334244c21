//! Closed enumerations that drive field evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The declared type of a contract field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// 64-bit floating point number.
    Float,
    /// 64-bit signed integer.
    Int,
    /// UTF-8 string.
    #[serde(alias = "str")]
    String,
    /// Boolean flag.
    Bool,
}

impl Default for FieldType {
    fn default() -> Self {
        Self::Float
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float => write!(f, "float"),
            Self::Int => write!(f, "int"),
            Self::String => write!(f, "string"),
            Self::Bool => write!(f, "bool"),
        }
    }
}

impl FieldType {
    /// Returns true for types that support range constraints and drift checks.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Float | Self::Int)
    }
}

/// How a constraint violation (or a missing value) is repaired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairPolicy {
    /// No repair; violations are reported as errors.
    None,
    /// Move out-of-range values to the nearest bound.
    Clamp,
    /// Replace violating values with the field default.
    Default,
    /// Remove the field from the validated output.
    Drop,
}

impl Default for RepairPolicy {
    fn default() -> Self {
        Self::None
    }
}

impl fmt::Display for RepairPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Clamp => write!(f, "clamp"),
            Self::Default => write!(f, "default"),
            Self::Drop => write!(f, "drop"),
        }
    }
}

/// The statistic a drift rule tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftKind {
    /// Absolute deviation of the observed value from an expected mean.
    MeanShift,
}

impl Default for DriftKind {
    fn default() -> Self {
        Self::MeanShift
    }
}

impl fmt::Display for DriftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MeanShift => write!(f, "mean_shift"),
        }
    }
}

/// Drift rule attached to a numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftPolicy {
    /// Which statistic to test.
    #[serde(default, alias = "type")]
    pub kind: DriftKind,
    /// Baseline mean of the field.
    pub expected_mean: f64,
    /// Maximum tolerated absolute deviation from the baseline.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    2.0
}

impl DriftPolicy {
    /// Creates a mean-shift drift rule.
    #[must_use]
    pub fn mean_shift(expected_mean: f64, threshold: f64) -> Self {
        Self {
            kind: DriftKind::MeanShift,
            expected_mean,
            threshold,
        }
    }
}
