//! Range and pattern constraint checks.

use crate::contracts::FieldSpec;
use crate::core::FieldType;
use serde_json::Value;

/// A constraint a coerced value failed to satisfy.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// Numeric value below the declared minimum.
    BelowMin {
        /// The observed value.
        value: f64,
        /// The declared minimum.
        min: f64,
    },
    /// Numeric value above the declared maximum.
    AboveMax {
        /// The observed value.
        value: f64,
        /// The declared maximum.
        max: f64,
    },
    /// String value does not match the declared pattern.
    PatternMismatch {
        /// The declared pattern source.
        pattern: String,
    },
}

impl Violation {
    /// The bound a clamp repair moves the value to, if the violation is numeric.
    #[must_use]
    pub fn clamp_bound(&self) -> Option<f64> {
        match self {
            Self::BelowMin { min, .. } => Some(*min),
            Self::AboveMax { max, .. } => Some(*max),
            Self::PatternMismatch { .. } => None,
        }
    }

    /// Human-readable description.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::BelowMin { value, min } => format!("value {value} below minimum {min}"),
            Self::AboveMax { value, max } => format!("value {value} above maximum {max}"),
            Self::PatternMismatch { pattern } => {
                format!("value does not match pattern '{pattern}'")
            }
        }
    }
}

/// Checks a value already coerced to `spec.field_type` against the field's
/// constraints, returning the first violation.
#[must_use]
pub fn check(spec: &FieldSpec, value: &Value) -> Option<Violation> {
    if spec.field_type.is_numeric() {
        let observed = value.as_f64()?;
        if let Some(min) = spec.min {
            if observed < min {
                return Some(Violation::BelowMin {
                    value: observed,
                    min,
                });
            }
        }
        if let Some(max) = spec.max {
            if observed > max {
                return Some(Violation::AboveMax {
                    value: observed,
                    max,
                });
            }
        }
        return None;
    }

    if let (Some(pattern), Some(text)) = (&spec.pattern, value.as_str()) {
        if !pattern.is_match(text) {
            return Some(Violation::PatternMismatch {
                pattern: pattern.as_str().to_string(),
            });
        }
    }
    None
}

/// Renders a bound in the canonical representation of the field type.
///
/// Integer bounds are validated as integral when the contract is parsed.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn bound_value(field_type: FieldType, bound: f64) -> Value {
    match field_type {
        FieldType::Int => Value::from(bound as i64),
        _ => serde_json::Number::from_f64(bound).map_or(Value::Null, Value::Number),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::FieldSpec;
    use serde_json::json;

    #[test]
    fn test_values_on_bounds_pass() {
        let spec = FieldSpec::new("humidity", FieldType::Float).with_range(0.0, 100.0);
        assert_eq!(check(&spec, &json!(0.0)), None);
        assert_eq!(check(&spec, &json!(100.0)), None);
        assert_eq!(check(&spec, &json!(55.5)), None);
    }

    #[test]
    fn test_out_of_range_violations() {
        let spec = FieldSpec::new("humidity", FieldType::Float).with_range(0.0, 100.0);

        let below = check(&spec, &json!(-0.5)).unwrap();
        assert_eq!(below, Violation::BelowMin { value: -0.5, min: 0.0 });
        assert_eq!(below.clamp_bound(), Some(0.0));

        let above = check(&spec, &json!(110)).unwrap();
        assert_eq!(above.clamp_bound(), Some(100.0));
        assert_eq!(above.describe(), "value 110 above maximum 100");
    }

    #[test]
    fn test_one_sided_range() {
        let mut spec = FieldSpec::new("attempts", FieldType::Int);
        spec.min = Some(0.0);
        assert!(check(&spec, &json!(1_000_000)).is_none());
        assert!(matches!(check(&spec, &json!(-1)), Some(Violation::BelowMin { .. })));
    }

    #[test]
    fn test_pattern_mismatch_has_no_clamp_bound() {
        let spec = FieldSpec::new("merchant_id", FieldType::String)
            .with_pattern("M-[0-9]{4}")
            .unwrap();
        assert_eq!(check(&spec, &json!("M-0042")), None);

        let violation = check(&spec, &json!("xxM-1234")).unwrap();
        assert_eq!(
            violation,
            Violation::PatternMismatch {
                pattern: "M-[0-9]{4}".to_string()
            }
        );
        assert_eq!(violation.clamp_bound(), None);
    }

    #[test]
    fn test_bound_value_representation() {
        assert_eq!(bound_value(FieldType::Int, 10.0), json!(10));
        assert!(bound_value(FieldType::Int, 10.0).is_i64());
        assert_eq!(bound_value(FieldType::Int, -40.0), json!(-40));
        assert_eq!(bound_value(FieldType::Float, 125.0), json!(125.0));
        assert!(bound_value(FieldType::Float, 125.0).is_f64());
    }
}
