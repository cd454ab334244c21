//! Benchmarks for record evaluation. Run with `cargo bench --features testing`.

use contractml::pipeline::ExecutionPipeline;
use contractml::testing::fixtures::{self, record};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

fn evaluate_benchmark(c: &mut Criterion) {
    let telemetry = fixtures::telemetry_v2();
    let in_range = record([("temp_c", json!(21.5)), ("humidity", json!(40.0))]);
    let repaired = record([("temp_c", json!(-50.0)), ("humidity", json!(110.0))]);

    c.bench_function("evaluate_telemetry_in_range", |b| {
        b.iter(|| ExecutionPipeline::evaluate_record(black_box(&telemetry), black_box(&in_range)));
    });
    c.bench_function("evaluate_telemetry_repaired", |b| {
        b.iter(|| ExecutionPipeline::evaluate_record(black_box(&telemetry), black_box(&repaired)));
    });

    let fraud = fixtures::fraud_v1();
    let transaction = record([
        ("amount", json!("129.99")),
        ("merchant_id", json!("M-0042")),
        ("attempts", json!(3)),
        ("device_score", json!(0.4)),
    ]);
    c.bench_function("evaluate_fraud", |b| {
        b.iter(|| ExecutionPipeline::evaluate_record(black_box(&fraud), black_box(&transaction)));
    });
}

criterion_group!(benches, evaluate_benchmark);
criterion_main!(benches);
