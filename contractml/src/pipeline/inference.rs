//! The inference collaborator contract.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::contracts::{ContractDefinition, InferenceBinding};
use crate::core::Record;
use crate::errors::InferenceError;

/// Named output vectors returned by a model.
pub type Predictions = BTreeMap<String, Vec<f64>>;

/// Input handed to an inference collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceRequest {
    /// Contract domain.
    pub domain: String,
    /// Contract version.
    pub version: String,
    /// The contract's binding, opaque to the engine.
    pub binding: InferenceBinding,
    /// Validated feature values in contract-declared order; dropped fields
    /// are omitted.
    pub features: Vec<(String, Value)>,
}

impl InferenceRequest {
    /// Builds a request from validated data, ordered by the contract.
    #[must_use]
    pub fn from_validated(
        contract: &ContractDefinition,
        binding: &InferenceBinding,
        validated: &Record,
    ) -> Self {
        let features = contract
            .fields
            .iter()
            .filter_map(|field| {
                validated
                    .get(&field.name)
                    .map(|value| (field.name.clone(), value.clone()))
            })
            .collect();

        Self {
            domain: contract.domain.clone(),
            version: contract.version.clone(),
            binding: binding.clone(),
            features,
        }
    }

    /// Feature names in order.
    #[must_use]
    pub fn feature_names(&self) -> Vec<&str> {
        self.features.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Encodes the features as a dense numeric vector.
    ///
    /// Booleans map to `0.0`/`1.0`; strings are rejected.
    pub fn feature_vector(&self) -> Result<Vec<f64>, InferenceError> {
        self.features
            .iter()
            .map(|(name, value)| match value {
                Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
                Value::Number(n) => n.as_f64().ok_or_else(|| InferenceError::InvalidInput {
                    feature: name.clone(),
                    reason: "number is not representable as f64".to_string(),
                }),
                other => Err(InferenceError::InvalidInput {
                    feature: name.clone(),
                    reason: format!("{} values are not numeric", crate::evaluator::json_kind(other)),
                }),
            })
            .collect()
    }
}

/// Runs a model over an ordered feature set.
///
/// The pipeline treats implementations as opaque and bounds every call with
/// a timeout.
#[async_trait]
pub trait InferenceCollaborator: Send + Sync {
    /// Produces predictions for one validated record.
    async fn predict(&self, request: &InferenceRequest) -> Result<Predictions, InferenceError>;
}
