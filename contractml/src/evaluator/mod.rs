//! Field evaluation: presence, type coercion, constraint repair and drift.
//!
//! [`evaluate`] is a pure function of a [`FieldSpec`] and the raw value
//! supplied for it. Steps run in a fixed order:
//!
//! 1. Presence (default substitution, drop, or a missing-field error)
//! 2. Type coercion (failure short-circuits the remaining steps)
//! 3. Constraint check with the field's repair policy
//! 4. Drift check on the observed value (advisory, never affects validity)

mod coercion;
mod constraints;
mod drift;
mod result;

pub use coercion::{coerce, json_kind, CoercionError};
pub use constraints::{bound_value, check as check_constraints, Violation};
pub use drift::detect as detect_drift;
pub use result::{FieldError, FieldErrorKind, FieldResult};

use crate::contracts::FieldSpec;
use crate::core::RepairPolicy;
use serde_json::Value;

/// Evaluates one field value against its spec.
///
/// A JSON `null` is treated the same as an absent value.
#[must_use]
pub fn evaluate(spec: &FieldSpec, raw: Option<&Value>) -> FieldResult {
    let raw = raw.filter(|value| !value.is_null());
    let mut result = FieldResult::new(raw.cloned());

    let observed = match (raw, &spec.default) {
        (Some(value), _) => value,
        (None, Some(default)) => default,
        (None, None) if spec.repair == RepairPolicy::Drop => {
            result.drop_value();
            return result;
        }
        (None, None) => {
            result.fail(FieldError::missing());
            return result;
        }
    };

    let coerced = match coerce(spec.field_type, observed) {
        Ok(value) => value,
        Err(err) => {
            result.value = Some(observed.clone());
            result.fail(FieldError::new(FieldErrorKind::Type, err.to_string()));
            return result;
        }
    };

    result.value = Some(coerced.clone());

    if let Some(violation) = check_constraints(spec, &coerced) {
        match (spec.repair, violation.clamp_bound()) {
            (RepairPolicy::Clamp, Some(bound)) => {
                result.value = Some(bound_value(spec.field_type, bound));
                result.repaired = true;
            }
            (RepairPolicy::Default, _) if spec.default.is_some() => {
                result.value.clone_from(&spec.default);
                result.repaired = true;
            }
            (RepairPolicy::Drop, _) => {
                result.drop_value();
                return result;
            }
            _ => {
                let kind = match violation {
                    Violation::PatternMismatch { .. } => FieldErrorKind::Pattern,
                    _ => FieldErrorKind::Range,
                };
                result.fail(FieldError::new(kind, violation.describe()));
            }
        }
    }

    if result.valid {
        if let (Some(policy), Some(observed)) = (&spec.drift, coerced.as_f64()) {
            result.drift_detected = detect_drift(policy, observed);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DriftPolicy, FieldType};
    use serde_json::json;

    fn temp_c() -> FieldSpec {
        FieldSpec::new("temp_c", FieldType::Float)
            .with_range(-40.0, 125.0)
            .with_repair(RepairPolicy::Clamp)
            .with_drift(DriftPolicy::mean_shift(20.0, 30.0))
    }

    #[test]
    fn test_in_range_value_is_valid() {
        let result = evaluate(&temp_c(), Some(&json!(25.0)));
        assert!(result.valid);
        assert!(!result.repaired);
        assert_eq!(result.value, Some(json!(25.0)));
        assert_eq!(result.original_value, Some(json!(25.0)));
        assert!(!result.drift_detected);
    }

    #[test]
    fn test_clamp_below_min() {
        let result = evaluate(&temp_c(), Some(&json!(-50.0)));
        assert!(result.valid);
        assert!(result.repaired);
        assert_eq!(result.value, Some(json!(-40.0)));
        assert_eq!(result.original_value, Some(json!(-50.0)));
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_clamp_above_max() {
        let result = evaluate(&temp_c(), Some(&json!(130)));
        assert!(result.valid);
        assert!(result.repaired);
        assert_eq!(result.value, Some(json!(125.0)));
    }

    #[test]
    fn test_clamped_value_still_flags_drift() {
        let result = evaluate(&temp_c(), Some(&json!(-50.0)));
        assert!(result.repaired);
        assert!(result.drift_detected);
    }

    #[test]
    fn test_int_clamp_keeps_integer_representation() {
        let spec = FieldSpec::new("count", FieldType::Int)
            .with_range(0.0, 10.0)
            .with_repair(RepairPolicy::Clamp);
        let result = evaluate(&spec, Some(&json!(42)));
        assert_eq!(result.value, Some(json!(10)));
    }

    #[test]
    fn test_missing_uses_default_without_repair_flag() {
        let spec = FieldSpec::new("humidity", FieldType::Float)
            .with_range(0.0, 100.0)
            .with_repair(RepairPolicy::Clamp)
            .with_default(json!(50.0));
        let result = evaluate(&spec, None);
        assert!(result.valid);
        assert!(!result.repaired);
        assert_eq!(result.value, Some(json!(50.0)));
        assert_eq!(result.original_value, None);
    }

    #[test]
    fn test_null_is_treated_as_missing() {
        let spec = FieldSpec::new("humidity", FieldType::Float).with_default(json!(50.0));
        let result = evaluate(&spec, Some(&Value::Null));
        assert_eq!(result.value, Some(json!(50.0)));
        assert_eq!(result.original_value, None);
    }

    #[test]
    fn test_missing_with_drop_policy() {
        let spec = FieldSpec::new("channel", FieldType::String).with_repair(RepairPolicy::Drop);
        let result = evaluate(&spec, None);
        assert!(result.dropped);
        assert!(result.value.is_none());
        assert!(!result.is_unrecovered());
    }

    #[test]
    fn test_missing_required_field() {
        let result = evaluate(&temp_c(), None);
        assert!(!result.valid);
        assert!(result.is_unrecovered());
        assert_eq!(result.errors, vec![FieldError::missing()]);
    }

    #[test]
    fn test_type_failure_short_circuits() {
        let result = evaluate(&temp_c(), Some(&json!("warm")));
        assert!(!result.valid);
        assert!(!result.repaired);
        assert!(!result.drift_detected);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, FieldErrorKind::Type);
        assert_eq!(result.value, Some(json!("warm")));
    }

    #[test]
    fn test_range_error_without_repair_keeps_value() {
        let spec = FieldSpec::new("pressure", FieldType::Float)
            .with_range(900.0, 1100.0)
            .with_drift(DriftPolicy::mean_shift(1000.0, 10.0));
        let result = evaluate(&spec, Some(&json!(1200.0)));
        assert!(!result.valid);
        assert_eq!(result.value, Some(json!(1200.0)));
        assert_eq!(result.errors[0].kind, FieldErrorKind::Range);
        assert!(!result.drift_detected);
    }

    #[test]
    fn test_range_violation_with_default_repair() {
        let spec = FieldSpec::new("humidity", FieldType::Float)
            .with_range(0.0, 100.0)
            .with_repair(RepairPolicy::Default)
            .with_default(json!(50.0));
        let result = evaluate(&spec, Some(&json!(140.0)));
        assert!(result.valid);
        assert!(result.repaired);
        assert_eq!(result.value, Some(json!(50.0)));
    }

    #[test]
    fn test_range_violation_with_drop_repair() {
        let spec = FieldSpec::new("speed", FieldType::Float)
            .with_range(0.0, 300.0)
            .with_repair(RepairPolicy::Drop)
            .with_drift(DriftPolicy::mean_shift(0.0, 1.0));
        let result = evaluate(&spec, Some(&json!(-5.0)));
        assert!(result.dropped);
        assert!(result.value.is_none());
        assert!(!result.drift_detected);
    }

    #[test]
    fn test_pattern_mismatch_is_reported() {
        let spec = FieldSpec::new("merchant", FieldType::String)
            .with_pattern("^[A-Z]{3}-[0-9]+$")
            .unwrap();
        let ok = evaluate(&spec, Some(&json!("ACM-42")));
        assert!(ok.valid);

        let bad = evaluate(&spec, Some(&json!("acme")));
        assert!(!bad.valid);
        assert_eq!(bad.errors[0].kind, FieldErrorKind::Pattern);
    }

    #[test]
    fn test_unanchored_pattern_rejects_leading_garbage() {
        let spec = FieldSpec::new("merchant_id", FieldType::String)
            .with_pattern("M-[0-9]{4}")
            .unwrap();

        let result = evaluate(&spec, Some(&json!("xxM-1234")));
        assert!(!result.valid);
        assert_eq!(result.errors[0].kind, FieldErrorKind::Pattern);
        assert_eq!(result.value, Some(json!("xxM-1234")));

        assert!(evaluate(&spec, Some(&json!("M-1234"))).valid);
    }

    #[test]
    fn test_bool_field_coerces_strings() {
        let spec = FieldSpec::new("is_international", FieldType::Bool);
        let result = evaluate(&spec, Some(&json!("yes")));
        assert!(result.valid);
        assert_eq!(result.value, Some(json!(true)));
    }
}
