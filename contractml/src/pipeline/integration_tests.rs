//! End-to-end tests: registry, evaluation, inference and migration together.

#[cfg(test)]
mod tests {
    use crate::config::{PipelineConfig, RegistryConfig};
    use crate::contracts::{ContractRegistry, InMemoryContractSource};
    use crate::core::ExecutionStatus;
    use crate::engine::ContractEngine;
    use crate::errors::InferenceError;
    use crate::events::{names, CollectingEventSink};
    use crate::pipeline::{ExecutionErrorKind, ExecutionPipeline, Predictions};
    use crate::testing::fixtures::{self, record};
    use crate::testing::{CountingSource, FailingInference, SlowInference, StaticInference};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn pipeline_with(inference: Arc<dyn crate::pipeline::InferenceCollaborator>) -> ExecutionPipeline {
        ExecutionPipeline::default().with_inference(inference)
    }

    #[tokio::test]
    async fn test_telemetry_out_of_range_is_repaired() {
        let contract = fixtures::telemetry_v2();
        let inference = Arc::new(StaticInference::default());
        let pipeline = pipeline_with(inference.clone());

        let result = pipeline
            .execute(
                &contract,
                &record([("temp_c", json!(-50.0)), ("humidity", json!(110.0))]),
            )
            .await;

        assert_eq!(
            result.validated_data,
            record([("temp_c", json!(-40.0)), ("humidity", json!(100.0))])
        );
        assert_eq!(result.status, ExecutionStatus::Partial);
        assert_eq!(result.repaired_fields(), vec!["humidity", "temp_c"]);
        assert!(result.errors.is_empty());

        let requests = inference.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].feature_names(), vec!["temp_c", "humidity"]);
        assert_eq!(requests[0].feature_vector().unwrap(), vec![-40.0, 100.0]);
        assert_eq!(result.predictions.unwrap()["score"], vec![60.0]);
    }

    #[tokio::test]
    async fn test_telemetry_missing_humidity_uses_default() {
        let pipeline = pipeline_with(Arc::new(StaticInference::default()));
        let result = pipeline
            .execute(&fixtures::telemetry_v2(), &record([("temp_c", json!(21.0))]))
            .await;

        assert_eq!(result.validated_data["humidity"], json!(50.0));
        let humidity = result.field("humidity").unwrap();
        assert!(humidity.valid);
        assert!(!humidity.repaired);
        assert_eq!(humidity.original_value, None);
        assert_eq!(result.status, ExecutionStatus::Success);
    }

    #[tokio::test]
    async fn test_telemetry_missing_required_field_fails() {
        let inference = Arc::new(StaticInference::default());
        let pipeline = pipeline_with(inference.clone());
        let result = pipeline
            .execute(&fixtures::telemetry_v2(), &record([("humidity", json!(45.0))]))
            .await;

        assert_eq!(result.status, ExecutionStatus::Failed);
        assert!(!result.field("temp_c").unwrap().errors.is_empty());
        assert!(result.predictions.is_none());
        assert_eq!(inference.call_count(), 0);
    }

    #[tokio::test]
    async fn test_reexecuting_validated_data_is_idempotent() {
        let contract = fixtures::telemetry_v2();
        let pipeline = pipeline_with(Arc::new(StaticInference::default()));

        let first = pipeline
            .execute(&contract, &record([("temp_c", json!(300)), ("humidity", json!(-5))]))
            .await;
        assert_eq!(first.status, ExecutionStatus::Partial);

        let second = pipeline.execute(&contract, &first.validated_data).await;
        assert_eq!(second.status, ExecutionStatus::Success);
        assert!(second.repaired_fields().is_empty());
        assert_eq!(second.validated_data, first.validated_data);
    }

    #[tokio::test]
    async fn test_drift_is_independent_of_repair() {
        let pipeline = pipeline_with(Arc::new(StaticInference::default()));
        let result = pipeline
            .execute(
                &fixtures::telemetry_v2(),
                &record([("temp_c", json!(-50.0)), ("humidity", json!(50.0))]),
            )
            .await;

        let temp = result.field("temp_c").unwrap();
        assert!(temp.repaired);
        assert!(temp.drift_detected);
        assert!(result.drift_detected);
        assert_eq!(result.drifted_fields(), vec!["temp_c"]);
    }

    #[tokio::test]
    async fn test_fraud_contract_mixed_outcomes() {
        let inference = Arc::new(StaticInference::new(Predictions::from([(
            "fraud_probability".to_string(),
            vec![0.12],
        )])));
        let pipeline = pipeline_with(inference.clone());

        let result = pipeline
            .execute(
                &fixtures::fraud_v1(),
                &record([
                    ("amount", json!("129.99")),
                    ("merchant_id", json!("M-0042")),
                    ("attempts", json!(14)),
                    ("device_score", json!(3.5)),
                ]),
            )
            .await;

        assert_eq!(result.status, ExecutionStatus::Partial);
        assert_eq!(
            result.validated_data,
            record([
                ("amount", json!(129.99)),
                ("merchant_id", json!("M-0042")),
                ("is_international", json!(false)),
                ("attempts", json!(10)),
            ])
        );
        assert_eq!(result.dropped_fields(), vec!["device_score"]);
        assert_eq!(
            inference.requests()[0].feature_names(),
            vec!["amount", "merchant_id", "is_international", "attempts"]
        );
        assert_eq!(result.predictions.unwrap()["fraud_probability"], vec![0.12]);
    }

    #[tokio::test]
    async fn test_fraud_pattern_and_unknown_field_fail() {
        let pipeline = pipeline_with(Arc::new(StaticInference::default()));
        let result = pipeline
            .execute(
                &fixtures::fraud_v1(),
                &record([
                    ("amount", json!(10.0)),
                    ("merchant_id", json!("acme")),
                    ("attempts", json!(1)),
                    ("channel", json!("web")),
                ]),
            )
            .await;

        assert_eq!(result.status, ExecutionStatus::Failed);
        assert_eq!(result.failed_fields(), vec!["merchant_id"]);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ExecutionErrorKind::UnknownField);
        assert!(result.predictions.is_none());
    }

    #[tokio::test]
    async fn test_inference_failure_downgrades_status() {
        let sink = Arc::new(CollectingEventSink::new());
        let pipeline = pipeline_with(Arc::new(FailingInference::new(
            InferenceError::ShapeMismatch {
                expected: 3,
                actual: 2,
            },
        )))
        .with_event_sink(sink.clone());

        let result = pipeline
            .execute(
                &fixtures::telemetry_v2(),
                &record([("temp_c", json!(20.0)), ("humidity", json!(30.0))]),
            )
            .await;

        assert_eq!(result.status, ExecutionStatus::Failed);
        assert!(result.predictions.is_none());
        assert_eq!(result.errors[0].kind, ExecutionErrorKind::InferenceUnavailable);
        assert!(result.errors[0].message.contains("shape mismatch"));
        assert!(result.field("temp_c").unwrap().valid);
        assert_eq!(sink.events_of_type(names::INFERENCE_FAILED).len(), 1);
        assert_eq!(sink.events_of_type(names::PIPELINE_COMPLETED).len(), 1);
    }

    #[tokio::test]
    async fn test_inference_timeout_downgrades_status() {
        let pipeline = ExecutionPipeline::new(
            PipelineConfig::new().with_inference_timeout(Duration::from_millis(20)),
        )
        .with_inference(Arc::new(SlowInference::with_delay_ms(500)));

        let result = pipeline
            .execute(
                &fixtures::telemetry_v2(),
                &record([("temp_c", json!(20.0)), ("humidity", json!(30.0))]),
            )
            .await;

        assert_eq!(result.status, ExecutionStatus::Failed);
        assert!(result.predictions.is_none());
        assert_eq!(result.errors[0].kind, ExecutionErrorKind::PipelineTimeout);
    }

    #[tokio::test]
    async fn test_contract_without_binding_skips_inference() {
        let pipeline = pipeline_with(Arc::new(FailingInference::model_unavailable("unused")));
        let result = pipeline
            .execute(
                &fixtures::telemetry_v1(),
                &record([("temperature", json!(20.0)), ("device_id", json!("dev-3"))]),
            )
            .await;

        assert_eq!(result.status, ExecutionStatus::Success);
        assert!(result.predictions.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_engine_executions_share_one_load() {
        let source = Arc::new(
            CountingSource::new(Arc::new(fixtures::fixture_source()))
                .with_delay(Duration::from_millis(30)),
        );
        let registry = Arc::new(ContractRegistry::with_config(
            source.clone(),
            RegistryConfig::new(),
        ));
        let engine = ContractEngine::new(
            registry,
            pipeline_with(Arc::new(StaticInference::default())),
        );

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    engine
                        .execute(
                            "telemetry",
                            "v2",
                            &record([("temp_c", json!(f64::from(i))), ("humidity", json!(40.0))]),
                        )
                        .await
                })
            })
            .collect();

        for handle in handles {
            let result = handle.await.unwrap().unwrap();
            assert_eq!(result.status, ExecutionStatus::Success);
        }
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_engine_reports_parse_errors() {
        let source = InMemoryContractSource::new().with_contract(
            "telemetry",
            "v3",
            json!({"fields": [{"name": "temp_c", "min": 10, "max": 0}]}),
        );
        let engine = ContractEngine::new(
            Arc::new(ContractRegistry::new(Arc::new(source))),
            ExecutionPipeline::default(),
        );

        let err = engine
            .execute("telemetry", "v3", &record([("temp_c", json!(1.0))]))
            .await
            .unwrap_err();
        assert_eq!(err.error_info().code, crate::errors::codes::PARSE);
    }
}
