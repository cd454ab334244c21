//! The execution pipeline.

use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info_span, warn, Instrument};

use super::{ExecutionError, ExecutionResult, InferenceCollaborator, InferenceRequest, Predictions};
use crate::config::PipelineConfig;
use crate::contracts::{ContractDefinition, InferenceBinding};
use crate::core::{ExecutionStatus, Record};
use crate::evaluator::{evaluate, FieldResult};
use crate::events::{names, EventSink, NoOpEventSink};

/// Evaluates records against contracts and runs bound inference.
///
/// The pipeline holds no per-call state; one instance can serve any number of
/// concurrent executions.
#[derive(Clone)]
pub struct ExecutionPipeline {
    config: PipelineConfig,
    inference: Option<Arc<dyn InferenceCollaborator>>,
    event_sink: Arc<dyn EventSink>,
}

impl Default for ExecutionPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl std::fmt::Debug for ExecutionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionPipeline")
            .field("config", &self.config)
            .field("has_inference", &self.inference.is_some())
            .finish_non_exhaustive()
    }
}

impl ExecutionPipeline {
    /// Creates a pipeline without an inference collaborator.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            inference: None,
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the inference collaborator.
    #[must_use]
    pub fn with_inference(mut self, inference: Arc<dyn InferenceCollaborator>) -> Self {
        self.inference = Some(inference);
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// The pipeline configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Evaluates a record without running inference.
    ///
    /// Fields are evaluated in declared order. Strict contracts reject keys
    /// they do not declare.
    #[must_use]
    pub fn evaluate_record(contract: &ContractDefinition, record: &Record) -> ExecutionResult {
        let mut field_results = BTreeMap::new();
        let mut validated_data = Record::new();

        for spec in &contract.fields {
            let result = evaluate(spec, record.get(&spec.name));
            if result.is_accepted() {
                if let Some(value) = &result.value {
                    validated_data.insert(spec.name.clone(), value.clone());
                }
            }
            field_results.insert(spec.name.clone(), result);
        }

        let errors: Vec<ExecutionError> = if contract.strict {
            record
                .keys()
                .filter(|key| contract.field(key).is_none())
                .map(ExecutionError::unknown_field)
                .collect()
        } else {
            Vec::new()
        };

        let drift_detected = field_results.values().any(|r| r.drift_detected);
        let status = compute_status(field_results.values(), !errors.is_empty());

        ExecutionResult {
            domain: contract.domain.clone(),
            version: contract.version.clone(),
            validated_data,
            field_results,
            predictions: None,
            drift_detected,
            status,
            errors,
            migrated_from: None,
        }
    }

    /// Executes a record against a contract.
    ///
    /// Data problems never surface as errors; they are captured on the
    /// returned result.
    pub async fn execute(&self, contract: &ContractDefinition, record: &Record) -> ExecutionResult {
        let span = info_span!(
            "contract.execute",
            domain = %contract.domain,
            version = %contract.version,
        );
        self.execute_inner(contract, record).instrument(span).await
    }

    async fn execute_inner(&self, contract: &ContractDefinition, record: &Record) -> ExecutionResult {
        let mut result = Self::evaluate_record(contract, record);

        if result.status != ExecutionStatus::Failed {
            if let Some(binding) = &contract.inference_binding {
                match self.run_inference(contract, binding, &result.validated_data).await {
                    Ok(predictions) => result.predictions = Some(predictions),
                    Err(error) => {
                        warn!(model = %binding.model, error = %error, "Inference failed");
                        self.event_sink.try_emit(
                            names::INFERENCE_FAILED,
                            Some(json!({
                                "domain": contract.domain,
                                "version": contract.version,
                                "model": binding.model,
                                "kind": error.kind,
                                "message": error.message,
                            })),
                        );
                        result.errors.push(error);
                        result.status = ExecutionStatus::Failed;
                    }
                }
            }
        }

        if result.drift_detected {
            self.event_sink.try_emit(
                names::DRIFT_DETECTED,
                Some(json!({
                    "domain": contract.domain,
                    "version": contract.version,
                    "fields": result.drifted_fields(),
                })),
            );
        }

        debug!(status = %result.status, drift = result.drift_detected, "Execution finished");
        self.event_sink.try_emit(
            names::PIPELINE_COMPLETED,
            Some(json!({
                "domain": contract.domain,
                "version": contract.version,
                "status": result.status,
                "drift_detected": result.drift_detected,
                "error_count": result.errors.len(),
            })),
        );

        result
    }

    async fn run_inference(
        &self,
        contract: &ContractDefinition,
        binding: &InferenceBinding,
        validated: &Record,
    ) -> Result<Predictions, ExecutionError> {
        let Some(inference) = &self.inference else {
            return Err(ExecutionError::inference_unavailable(format!(
                "no inference collaborator configured for model '{}'",
                binding.model
            )));
        };

        let request = InferenceRequest::from_validated(contract, binding, validated);
        let bound = self.config.inference_timeout();

        match timeout(bound, inference.predict(&request)).await {
            Ok(Ok(predictions)) => Ok(predictions),
            Ok(Err(error)) => Err(ExecutionError::inference_unavailable(error.to_string())),
            Err(_) => Err(ExecutionError::timeout(bound)),
        }
    }
}

/// Aggregates field outcomes into an execution status.
///
/// Any unrecovered field error or record-level error fails the execution;
/// repairs and drops alone make it partial.
pub fn compute_status<'a>(
    field_results: impl IntoIterator<Item = &'a FieldResult>,
    has_record_errors: bool,
) -> ExecutionStatus {
    if has_record_errors {
        return ExecutionStatus::Failed;
    }

    let mut touched = false;
    for result in field_results {
        if result.is_unrecovered() {
            return ExecutionStatus::Failed;
        }
        touched |= result.repaired || result.dropped;
    }

    if touched {
        ExecutionStatus::Partial
    } else {
        ExecutionStatus::Success
    }
}
