//! Mock collaborators for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::contracts::{ContractKey, ContractSource};
use crate::errors::{InferenceError, SourceError};
use crate::pipeline::{InferenceCollaborator, InferenceRequest, Predictions};

/// An inference collaborator that records requests and returns fixed
/// predictions.
///
/// By default it answers with a single `score` output holding the sum of the
/// feature vector.
#[derive(Debug, Default)]
pub struct StaticInference {
    predictions: Option<Predictions>,
    requests: Mutex<Vec<InferenceRequest>>,
}

impl StaticInference {
    /// Creates a collaborator returning `predictions` for every call.
    #[must_use]
    pub fn new(predictions: Predictions) -> Self {
        Self {
            predictions: Some(predictions),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Returns every request received.
    #[must_use]
    pub fn requests(&self) -> Vec<InferenceRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl InferenceCollaborator for StaticInference {
    async fn predict(&self, request: &InferenceRequest) -> Result<Predictions, InferenceError> {
        self.requests.lock().push(request.clone());
        match &self.predictions {
            Some(predictions) => Ok(predictions.clone()),
            None => {
                let score: f64 = request.feature_vector()?.iter().sum();
                Ok(Predictions::from([("score".to_string(), vec![score])]))
            }
        }
    }
}

/// An inference collaborator that always fails.
#[derive(Debug, Clone)]
pub struct FailingInference {
    error: InferenceError,
}

impl FailingInference {
    /// Creates a collaborator failing with `error`.
    #[must_use]
    pub fn new(error: InferenceError) -> Self {
        Self { error }
    }

    /// Creates a collaborator whose model cannot be loaded.
    #[must_use]
    pub fn model_unavailable(model: impl Into<String>) -> Self {
        Self::new(InferenceError::model_unavailable(model, "artifact missing"))
    }
}

#[async_trait]
impl InferenceCollaborator for FailingInference {
    async fn predict(&self, _request: &InferenceRequest) -> Result<Predictions, InferenceError> {
        Err(self.error.clone())
    }
}

/// An inference collaborator that takes time to answer.
#[derive(Debug, Clone)]
pub struct SlowInference {
    delay: Duration,
}

impl SlowInference {
    /// Creates a collaborator sleeping for `delay` before answering.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Creates a slow collaborator with delay in milliseconds.
    #[must_use]
    pub fn with_delay_ms(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

#[async_trait]
impl InferenceCollaborator for SlowInference {
    async fn predict(&self, _request: &InferenceRequest) -> Result<Predictions, InferenceError> {
        tokio::time::sleep(self.delay).await;
        Ok(Predictions::from([("score".to_string(), vec![0.0])]))
    }
}

/// A contract source wrapper that counts fetches and can add latency.
pub struct CountingSource {
    inner: Arc<dyn ContractSource>,
    delay: Option<Duration>,
    fetches: AtomicUsize,
}

impl std::fmt::Debug for CountingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountingSource")
            .field("delay", &self.delay)
            .field("fetches", &self.fetch_count())
            .finish_non_exhaustive()
    }
}

impl CountingSource {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn ContractSource>) -> Self {
        Self {
            inner,
            delay: None,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Delays every fetch by `delay`.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns the number of fetches served.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContractSource for CountingSource {
    async fn fetch(&self, domain: &str, version: &str) -> Result<Value, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.fetch(domain, version).await
    }

    async fn list(&self) -> Result<Vec<ContractKey>, SourceError> {
        self.inner.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::InferenceBinding;
    use crate::testing::fixtures;
    use serde_json::json;

    fn request() -> InferenceRequest {
        InferenceRequest {
            domain: "telemetry".to_string(),
            version: "v2".to_string(),
            binding: InferenceBinding::new("models/telemetry.onnx"),
            features: vec![
                ("temp_c".to_string(), json!(20.0)),
                ("humidity".to_string(), json!(50.0)),
            ],
        }
    }

    #[tokio::test]
    async fn test_static_inference_records_requests() {
        let inference = StaticInference::default();
        let predictions = inference.predict(&request()).await.unwrap();
        assert_eq!(predictions["score"], vec![70.0]);
        assert_eq!(inference.call_count(), 1);
        assert_eq!(inference.requests()[0].domain, "telemetry");
    }

    #[tokio::test]
    async fn test_failing_inference() {
        let inference = FailingInference::model_unavailable("models/telemetry.onnx");
        assert!(matches!(
            inference.predict(&request()).await,
            Err(InferenceError::ModelUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_counting_source() {
        let source = CountingSource::new(Arc::new(fixtures::fixture_source()));
        assert!(source.fetch("telemetry", "v2").await.is_ok());
        assert!(source.fetch("telemetry", "v9").await.is_err());
        assert_eq!(source.fetch_count(), 2);
        assert_eq!(source.list().await.unwrap().len(), 3);
    }
}
