//! Lax, deterministic coercion of JSON values to declared field types.

use crate::core::FieldType;
use serde_json::{Number, Value};
use thiserror::Error;

/// A value could not be converted to the declared field type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, got {found} {rendered}")]
pub struct CoercionError {
    /// The declared field type.
    pub expected: FieldType,
    /// JSON kind of the offending value.
    pub found: &'static str,
    /// Compact rendering of the offending value.
    pub rendered: String,
}

impl CoercionError {
    fn new(expected: FieldType, raw: &Value) -> Self {
        Self {
            expected,
            found: json_kind(raw),
            rendered: raw.to_string(),
        }
    }
}

/// Coerces `raw` to `field_type`, returning the canonical JSON representation.
///
/// Floats are always finite and stored as JSON floats, integers as JSON
/// integers. Strings are never produced from non-string input.
pub fn coerce(field_type: FieldType, raw: &Value) -> Result<Value, CoercionError> {
    let coerced = match field_type {
        FieldType::Float => coerce_float(raw).and_then(finite_number),
        FieldType::Int => coerce_int(raw).map(Value::from),
        FieldType::String => raw.as_str().map(|s| Value::String(s.to_string())),
        FieldType::Bool => coerce_bool(raw).map(Value::Bool),
    };
    coerced.ok_or_else(|| CoercionError::new(field_type, raw))
}

fn coerce_float(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn finite_number(value: f64) -> Option<Value> {
    if value.is_finite() {
        Number::from_f64(value).map(Value::Number)
    } else {
        None
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn coerce_int(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(i);
            }
            if n.is_u64() {
                return None;
            }
            let f = n.as_f64()?;
            let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
            (f.is_finite() && f.fract() == 0.0 && in_range).then(|| f as i64)
        }
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn coerce_bool(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Returns the JSON kind name of a value.
#[must_use]
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_float_accepts_integers_and_numeric_strings() {
        assert_eq!(coerce(FieldType::Float, &json!(25)).unwrap(), json!(25.0));
        assert_eq!(coerce(FieldType::Float, &json!(" 12.5 ")).unwrap(), json!(12.5));
    }

    #[test]
    fn test_float_rejects_non_finite_and_bools() {
        assert!(coerce(FieldType::Float, &json!("NaN")).is_err());
        assert!(coerce(FieldType::Float, &json!("inf")).is_err());
        assert!(coerce(FieldType::Float, &json!(true)).is_err());
        assert!(coerce(FieldType::Float, &json!([1.0])).is_err());
    }

    #[test]
    fn test_int_accepts_integral_floats_only() {
        assert_eq!(coerce(FieldType::Int, &json!(7)).unwrap(), json!(7));
        assert_eq!(coerce(FieldType::Int, &json!(3.0)).unwrap(), json!(3));
        assert_eq!(coerce(FieldType::Int, &json!("-4")).unwrap(), json!(-4));
        assert!(coerce(FieldType::Int, &json!(3.5)).is_err());
        assert!(coerce(FieldType::Int, &json!(u64::MAX)).is_err());
        assert!(coerce(FieldType::Int, &json!("4.2")).is_err());
    }

    #[test]
    fn test_string_is_strict() {
        assert_eq!(coerce(FieldType::String, &json!("abc")).unwrap(), json!("abc"));
        assert!(coerce(FieldType::String, &json!(42)).is_err());
    }

    #[test]
    fn test_bool_accepts_common_spellings() {
        assert_eq!(coerce(FieldType::Bool, &json!(true)).unwrap(), json!(true));
        assert_eq!(coerce(FieldType::Bool, &json!(0)).unwrap(), json!(false));
        assert_eq!(coerce(FieldType::Bool, &json!("YES")).unwrap(), json!(true));
        assert_eq!(coerce(FieldType::Bool, &json!("off")).unwrap(), json!(false));
        assert!(coerce(FieldType::Bool, &json!(2)).is_err());
        assert!(coerce(FieldType::Bool, &json!("maybe")).is_err());
    }

    #[test]
    fn test_coercion_error_message() {
        let err = coerce(FieldType::Float, &json!("warm")).unwrap_err();
        assert_eq!(err.found, "string");
        assert_eq!(err.to_string(), r#"expected float, got string "warm""#);
    }
}
