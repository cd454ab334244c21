//! Contract fixtures shared by tests and benchmarks.
//!
//! - `telemetry/v1`: `temperature` (clamped float with drift) and `device_id`
//! - `telemetry/v2`: `temp_c` (renamed from `temperature`) and `humidity`
//!   (clamped float with a default of 50.0)
//! - `fraud/v1`: a strict contract covering int, pattern, bool and drop fields

use serde_json::{json, Value};

use crate::contracts::{ContractDefinition, InMemoryContractSource};
use crate::core::Record;

/// Raw `telemetry/v1` document.
#[must_use]
pub fn telemetry_v1_document() -> Value {
    json!({
        "domain": "telemetry",
        "version": "v1",
        "description": "Device telemetry, first revision",
        "fields": [
            {
                "name": "temperature",
                "type": "float",
                "min": -40.0,
                "max": 125.0,
                "repair": "clamp",
                "drift": {"type": "mean_shift", "expected_mean": 20.0, "threshold": 30.0}
            },
            {
                "name": "device_id",
                "type": "string",
                "pattern": "^dev-[0-9]+$"
            }
        ]
    })
}

/// Raw `telemetry/v2` document.
#[must_use]
pub fn telemetry_v2_document() -> Value {
    json!({
        "domain": "telemetry",
        "version": "v2",
        "description": "Device telemetry with humidity",
        "fields": [
            {
                "name": "temp_c",
                "type": "float",
                "min": -40.0,
                "max": 125.0,
                "repair": "clamp",
                "drift": {"type": "mean_shift", "expected_mean": 20.0, "threshold": 30.0},
                "renamed_from": ["temperature"]
            },
            {
                "name": "humidity",
                "type": "float",
                "min": 0.0,
                "max": 100.0,
                "default": 50.0,
                "repair": "clamp"
            }
        ],
        "inference": {"model": "models/telemetry.onnx"}
    })
}

/// Raw `fraud/v1` document.
#[must_use]
pub fn fraud_v1_document() -> Value {
    json!({
        "domain": "fraud",
        "version": "v1",
        "strict": true,
        "fields": [
            {"name": "amount", "type": "float", "min": 0.0, "max": 1_000_000.0},
            {"name": "merchant_id", "type": "str", "pattern": "^M-[0-9]{4}$"},
            {"name": "is_international", "type": "bool", "default": false},
            {"name": "attempts", "type": "int", "min": 0, "max": 10, "repair": "clamp"},
            {"name": "device_score", "type": "float", "min": 0.0, "max": 1.0, "repair": "drop"}
        ],
        "inference": {"model": "models/fraud.onnx", "options": {"threshold": "0.8"}}
    })
}

/// Parsed `telemetry/v1`.
///
/// # Panics
///
/// Panics if the fixture document is invalid.
#[must_use]
pub fn telemetry_v1() -> ContractDefinition {
    parse("telemetry", "v1", &telemetry_v1_document())
}

/// Parsed `telemetry/v2`.
///
/// # Panics
///
/// Panics if the fixture document is invalid.
#[must_use]
pub fn telemetry_v2() -> ContractDefinition {
    parse("telemetry", "v2", &telemetry_v2_document())
}

/// Parsed `fraud/v1`.
///
/// # Panics
///
/// Panics if the fixture document is invalid.
#[must_use]
pub fn fraud_v1() -> ContractDefinition {
    parse("fraud", "v1", &fraud_v1_document())
}

fn parse(domain: &str, version: &str, document: &Value) -> ContractDefinition {
    match ContractDefinition::parse(domain, version, document) {
        Ok(contract) => contract,
        Err(err) => panic!("fixture {domain}/{version} is invalid: {err}"),
    }
}

/// A source serving every fixture document.
#[must_use]
pub fn fixture_source() -> InMemoryContractSource {
    InMemoryContractSource::new()
        .with_contract("telemetry", "v1", telemetry_v1_document())
        .with_contract("telemetry", "v2", telemetry_v2_document())
        .with_contract("fraud", "v1", fraud_v1_document())
}

/// Builds a record from key/value pairs.
#[must_use]
pub fn record<const N: usize>(pairs: [(&str, Value); N]) -> Record {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
