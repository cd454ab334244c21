//! In-memory contract definitions and their parsing from source documents.

use crate::core::{DriftPolicy, FieldType, RepairPolicy};
use crate::errors::ContractError;
use crate::evaluator::{check_constraints, coerce};
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Identity of a contract: `(domain, version)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContractKey {
    /// Contract domain (e.g. "telemetry").
    pub domain: String,
    /// Contract version (e.g. "v2").
    pub version: String,
}

impl ContractKey {
    /// Creates a new contract key.
    #[must_use]
    pub fn new(domain: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ContractKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.domain, self.version)
    }
}

/// A compiled string pattern constraint.
///
/// Patterns are anchored at the start of the value: `M-[0-9]{4}` accepts
/// `M-1234x` but not `xM-1234`. Add `$` to also anchor the end.
#[derive(Debug, Clone)]
pub struct FieldPattern {
    source: String,
    regex: Regex,
}

impl FieldPattern {
    /// Compiles a pattern.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: pattern.to_string(),
            regex: Regex::new(&format!("^(?:{pattern})"))?,
        })
    }

    /// Returns true if `text` matches the pattern from its first character.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// The pattern source as declared.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl PartialEq for FieldPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for FieldPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One field of a contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    /// Field name, unique within the contract.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Inclusive lower bound (numeric types only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Inclusive upper bound (numeric types only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Default value, already coerced to `field_type`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Repair policy for violations and absence.
    pub repair: RepairPolicy,
    /// Optional drift rule (numeric types only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift: Option<DriftPolicy>,
    /// Optional pattern constraint (string type only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<FieldPattern>,
    /// Older names this field replaces, used during migration.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub renamed_from: Vec<String>,
    /// Free text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSpec {
    /// Creates an unconstrained field with no repair policy.
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            min: None,
            max: None,
            default: None,
            repair: RepairPolicy::None,
            drift: None,
            pattern: None,
            renamed_from: Vec::new(),
            description: None,
        }
    }

    /// Sets both range bounds.
    #[must_use]
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets the repair policy.
    #[must_use]
    pub fn with_repair(mut self, repair: RepairPolicy) -> Self {
        self.repair = repair;
        self
    }

    /// Sets the drift rule.
    #[must_use]
    pub fn with_drift(mut self, drift: DriftPolicy) -> Self {
        self.drift = Some(drift);
        self
    }

    /// Sets the pattern constraint.
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.pattern = Some(FieldPattern::new(pattern)?);
        Ok(self)
    }

    /// Adds a former name of this field.
    #[must_use]
    pub fn renamed_from(mut self, name: impl Into<String>) -> Self {
        self.renamed_from.push(name.into());
        self
    }

    /// Checks the field's internal invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("field name cannot be empty".to_string());
        }

        let numeric = self.field_type.is_numeric();
        for (label, bound) in [("min", self.min), ("max", self.max)] {
            let Some(bound) = bound else { continue };
            if !numeric {
                return Err(format!("{label} is only allowed on numeric fields"));
            }
            if !bound.is_finite() {
                return Err(format!("{label} must be finite"));
            }
            if self.field_type == FieldType::Int && bound.fract() != 0.0 {
                return Err(format!("{label} must be an integer for int fields"));
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(format!("min {min} is greater than max {max}"));
            }
        }

        if self.pattern.is_some() && self.field_type != FieldType::String {
            return Err("pattern is only allowed on string fields".to_string());
        }

        match self.repair {
            RepairPolicy::Clamp if self.min.is_none() || self.max.is_none() => {
                return Err("repair 'clamp' requires both min and max".to_string());
            }
            RepairPolicy::Default if self.default.is_none() => {
                return Err("repair 'default' requires a default value".to_string());
            }
            _ => {}
        }

        if let Some(default) = &self.default {
            let coerced = coerce(self.field_type, default)
                .map_err(|err| format!("default is not a valid {}: {err}", self.field_type))?;
            if let Some(violation) = check_constraints(self, &coerced) {
                return Err(format!("default violates constraints: {}", violation.describe()));
            }
        }

        if let Some(drift) = &self.drift {
            if !numeric {
                return Err("drift is only allowed on numeric fields".to_string());
            }
            if !drift.expected_mean.is_finite() {
                return Err("drift expected_mean must be finite".to_string());
            }
            if !drift.threshold.is_finite() || drift.threshold < 0.0 {
                return Err("drift threshold must be a finite non-negative number".to_string());
            }
        }

        Ok(())
    }
}

/// Opaque reference to the model an inference collaborator should run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceBinding {
    /// Model reference (path, registry id, ...), resolved by the collaborator.
    pub model: String,
    /// Collaborator-specific options.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

impl InferenceBinding {
    /// Creates a binding to `model`.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            options: BTreeMap::new(),
        }
    }
}

/// Wire shape of a field in a contract source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDocument {
    /// Field name.
    pub name: String,
    /// Declared type; floats when omitted.
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Inclusive lower bound.
    #[serde(default)]
    pub min: Option<f64>,
    /// Inclusive upper bound.
    #[serde(default)]
    pub max: Option<f64>,
    /// Default value.
    #[serde(default)]
    pub default: Option<Value>,
    /// Repair policy.
    #[serde(default)]
    pub repair: RepairPolicy,
    /// Drift rule.
    #[serde(default)]
    pub drift: Option<DriftPolicy>,
    /// Pattern constraint.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Former field names.
    #[serde(default)]
    pub renamed_from: Vec<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Wire shape of a contract source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractDocument {
    /// Optional domain; must match the requested key when present.
    #[serde(default)]
    pub domain: Option<String>,
    /// Optional version; must match the requested key when present.
    #[serde(default)]
    pub version: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Ordered field list.
    pub fields: Vec<FieldDocument>,
    /// Inference binding.
    #[serde(default)]
    pub inference: Option<InferenceBinding>,
    /// Reject record keys the contract does not declare.
    #[serde(default)]
    pub strict: bool,
}

/// A parsed, validated, immutable contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractDefinition {
    /// Contract domain.
    pub domain: String,
    /// Contract version.
    pub version: String,
    /// Fields in declared order.
    pub fields: Vec<FieldSpec>,
    /// Optional inference binding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inference_binding: Option<InferenceBinding>,
    /// Free text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether undeclared record keys fail execution.
    pub strict: bool,
    /// SHA-256 of the canonical source document.
    pub fingerprint: String,
}

impl ContractDefinition {
    /// Parses and validates a raw source document for `domain`/`version`.
    pub fn parse(domain: &str, version: &str, raw: &Value) -> Result<Self, ContractError> {
        let invalid = |reason: String| ContractError::parse(domain, version, reason);

        let document: ContractDocument =
            serde_json::from_value(raw.clone()).map_err(|err| invalid(err.to_string()))?;

        for (label, declared, expected) in [
            ("domain", &document.domain, domain),
            ("version", &document.version, version),
        ] {
            if let Some(declared) = declared {
                if declared != expected {
                    return Err(invalid(format!(
                        "document declares {label} '{declared}' but was loaded as '{expected}'"
                    )));
                }
            }
        }

        if document.fields.is_empty() {
            return Err(invalid("contract declares no fields".to_string()));
        }

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(document.fields.len());
        for field in document.fields {
            let name = field.name.clone();
            if !seen.insert(name.clone()) {
                return Err(invalid(format!("duplicate field '{name}'")));
            }
            let spec = build_field(field).map_err(|reason| invalid(format!("field '{name}': {reason}")))?;
            fields.push(spec);
        }

        if let Some(binding) = &document.inference {
            if binding.model.trim().is_empty() {
                return Err(invalid("inference binding has an empty model reference".to_string()));
            }
        }

        Ok(Self {
            domain: domain.to_string(),
            version: version.to_string(),
            fields,
            inference_binding: document.inference,
            description: document.description,
            strict: document.strict,
            fingerprint: fingerprint(raw),
        })
    }

    /// Builds a definition from already-constructed field specs.
    pub fn from_fields(
        domain: impl Into<String>,
        version: impl Into<String>,
        fields: Vec<FieldSpec>,
    ) -> Result<Self, ContractError> {
        let domain = domain.into();
        let version = version.into();
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(ContractError::parse(
                    &domain,
                    &version,
                    format!("duplicate field '{}'", field.name),
                ));
            }
            field.validate().map_err(|reason| {
                ContractError::parse(&domain, &version, format!("field '{}': {reason}", field.name))
            })?;
        }
        let fingerprint = serde_json::to_value(&fields)
            .map(|value| fingerprint(&value))
            .unwrap_or_default();
        Ok(Self {
            domain,
            version,
            fields,
            inference_binding: None,
            description: None,
            strict: false,
            fingerprint,
        })
    }

    /// Attaches an inference binding.
    #[must_use]
    pub fn with_inference(mut self, binding: InferenceBinding) -> Self {
        self.inference_binding = Some(binding);
        self
    }

    /// Marks the contract as strict.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// The `(domain, version)` identity.
    #[must_use]
    pub fn key(&self) -> ContractKey {
        ContractKey::new(&self.domain, &self.version)
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in declared order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

fn build_field(doc: FieldDocument) -> Result<FieldSpec, String> {
    let pattern = doc
        .pattern
        .as_deref()
        .map(FieldPattern::new)
        .transpose()
        .map_err(|err| format!("invalid pattern: {err}"))?;

    let mut spec = FieldSpec {
        name: doc.name,
        field_type: doc.field_type,
        min: doc.min,
        max: doc.max,
        default: doc.default.filter(|value| !value.is_null()),
        repair: doc.repair,
        drift: doc.drift,
        pattern,
        renamed_from: doc.renamed_from,
        description: doc.description,
    };
    spec.validate()?;

    // Store the default in canonical form so substitution needs no coercion.
    if let Some(default) = spec.default.take() {
        spec.default = Some(coerce(spec.field_type, &default).map_err(|err| err.to_string())?);
    }
    Ok(spec)
}

fn fingerprint(raw: &Value) -> String {
    let canonical = raw.to_string();
    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(digest)
}
