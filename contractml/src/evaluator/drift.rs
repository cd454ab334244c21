//! Drift detection against an expected distribution.

use crate::core::{DriftKind, DriftPolicy};

/// Returns true when `observed` deviates from the policy's baseline by more
/// than the tolerated threshold.
#[must_use]
pub fn detect(policy: &DriftPolicy, observed: f64) -> bool {
    match policy.kind {
        DriftKind::MeanShift => (observed - policy.expected_mean).abs() > policy.threshold,
    }
}
