//! Error types for the contractml engine.
//!
//! Loading and configuration problems are raised as errors. Per-field and
//! per-record data problems are never raised; they are captured inside
//! [`FieldResult`](crate::evaluator::FieldResult) and
//! [`ExecutionResult`](crate::pipeline::ExecutionResult).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for contractml operations.
#[derive(Debug, Error)]
pub enum ContractMlError {
    /// A contract could not be loaded.
    #[error("{0}")]
    Contract(#[from] ContractError),

    /// The engine configuration is invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while resolving a contract definition.
///
/// `Clone` so that every caller waiting on the same cold load observes the
/// same failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// No source document exists for the key.
    #[error("Contract not found: {domain}/{version}")]
    NotFound {
        /// The contract domain.
        domain: String,
        /// The contract version.
        version: String,
    },

    /// The source document is malformed or violates a contract invariant.
    #[error("Contract {domain}/{version} is malformed: {reason}")]
    Parse {
        /// The contract domain.
        domain: String,
        /// The contract version.
        version: String,
        /// What is wrong with the document.
        reason: String,
    },

    /// The source failed for a reason unrelated to the document itself.
    #[error("Contract source failed for {domain}/{version}: {reason}")]
    Source {
        /// The contract domain.
        domain: String,
        /// The contract version.
        version: String,
        /// The underlying failure.
        reason: String,
    },
}

impl ContractError {
    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(domain: impl Into<String>, version: impl Into<String>) -> Self {
        Self::NotFound {
            domain: domain.into(),
            version: version.into(),
        }
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(
        domain: impl Into<String>,
        version: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Parse {
            domain: domain.into(),
            version: version.into(),
            reason: reason.into(),
        }
    }

    /// Creates a source failure error.
    #[must_use]
    pub fn source_failure(
        domain: impl Into<String>,
        version: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Source {
            domain: domain.into(),
            version: version.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for unknown domain/version errors.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Builds diagnostic metadata for API responses and logs.
    #[must_use]
    pub fn error_info(&self) -> ContractErrorInfo {
        match self {
            Self::NotFound { domain, version } => {
                ContractErrorInfo::new(codes::NOT_FOUND, self.to_string())
                    .with_fix_hint("Check the domain and version, or list available contracts.")
                    .with_context_entry("domain", domain.as_str())
                    .with_context_entry("version", version.as_str())
            }
            Self::Parse {
                domain,
                version,
                reason,
            } => ContractErrorInfo::new(codes::PARSE, self.to_string())
                .with_fix_hint("Fix the contract document; it will be reloaded on next access.")
                .with_context_entry("domain", domain.as_str())
                .with_context_entry("version", version.as_str())
                .with_context_entry("reason", reason.as_str()),
            Self::Source {
                domain,
                version,
                reason,
            } => ContractErrorInfo::new(codes::SOURCE, self.to_string())
                .with_context_entry("domain", domain.as_str())
                .with_context_entry("version", version.as_str())
                .with_context_entry("reason", reason.as_str()),
        }
    }
}

/// Failures reported by a [`ContractSource`](crate::contracts::ContractSource).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The source has no document for the requested key.
    #[error("not found")]
    NotFound,

    /// The document exists but could not be decoded.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// The source could not be read.
    #[error("io error: {0}")]
    Io(String),
}

/// Failures reported by an inference collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    /// The model artifact could not be loaded or is not available.
    #[error("Model unavailable: {model} - {reason}")]
    ModelUnavailable {
        /// The model reference from the inference binding.
        model: String,
        /// Why the model is unavailable.
        reason: String,
    },

    /// The input vector does not match the model's expected shape.
    #[error("Input shape mismatch: expected {expected} features, got {actual}")]
    ShapeMismatch {
        /// Feature count the model expects.
        expected: usize,
        /// Feature count supplied.
        actual: usize,
    },

    /// A feature value cannot be represented as a model input.
    #[error("Invalid input for feature '{feature}': {reason}")]
    InvalidInput {
        /// The offending feature.
        feature: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl InferenceError {
    /// Creates a model-unavailable error.
    #[must_use]
    pub fn model_unavailable(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            model: model.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while building or validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A configuration value is out of range or unparseable.
    #[error("Invalid configuration for '{key}': {reason}")]
    Invalid {
        /// The offending key.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A required configuration value is missing.
    #[error("Missing configuration value: {0}")]
    Missing(String),

    /// The configuration document could not be decoded.
    #[error("Configuration parse error: {0}")]
    Parse(String),
}

impl ConfigError {
    /// Creates an invalid-value error.
    #[must_use]
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Metadata about a contract error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "CONTRACT-404-NOT_FOUND").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Stable contract error codes.
pub mod codes {
    /// Unknown domain/version.
    pub const NOT_FOUND: &str = "CONTRACT-404-NOT_FOUND";
    /// Malformed contract document.
    pub const PARSE: &str = "CONTRACT-500-PARSE";
    /// Contract source failure.
    pub const SOURCE: &str = "CONTRACT-503-SOURCE";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error_info() {
        let err = ContractError::not_found("telemetry", "v9");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Contract not found: telemetry/v9");

        let info = err.error_info();
        assert_eq!(info.code, codes::NOT_FOUND);
        assert_eq!(info.context.get("version"), Some(&"v9".to_string()));
        assert!(info.fix_hint.is_some());
    }

    #[test]
    fn test_parse_error_info_carries_reason() {
        let err = ContractError::parse("telemetry", "v2", "field 'x': clamp requires min and max");
        assert!(!err.is_not_found());

        let info = err.error_info();
        assert_eq!(info.code, codes::PARSE);
        assert_eq!(
            info.context.get("reason"),
            Some(&"field 'x': clamp requires min and max".to_string())
        );
    }

    #[test]
    fn test_contract_error_info_serializes_for_api_responses() {
        let info = ContractError::source_failure("fraud", "v1", "permission denied").error_info();
        assert_eq!(info.code, codes::SOURCE);
        assert!(info.fix_hint.is_none());

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["code"], "CONTRACT-503-SOURCE");
        assert_eq!(json["context"]["reason"], "permission denied");
    }

    #[test]
    fn test_contract_ml_error_from_contract_error() {
        let err: ContractMlError = ContractError::not_found("fraud", "v1").into();
        assert!(matches!(err, ContractMlError::Contract(_)));
        assert_eq!(err.to_string(), "Contract not found: fraud/v1");
    }

    #[test]
    fn test_inference_error_display() {
        let err = InferenceError::model_unavailable("models/telemetry.onnx", "file missing");
        assert_eq!(
            err.to_string(),
            "Model unavailable: models/telemetry.onnx - file missing"
        );

        let err = InferenceError::ShapeMismatch {
            expected: 3,
            actual: 2,
        };
        assert!(err.to_string().contains("expected 3"));
    }
}
