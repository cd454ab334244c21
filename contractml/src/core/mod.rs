//! Core domain model types for contractml.
//!
//! This module contains the fundamental types shared by every layer:
//! - Field type, repair and drift policy enums
//! - Execution status
//! - The [`Record`] shape consumed by the pipeline

mod kinds;
mod status;

pub use kinds::{DriftKind, DriftPolicy, FieldType, RepairPolicy};
pub use status::ExecutionStatus;

use std::collections::BTreeMap;

/// A semi-structured input or output record keyed by field name.
///
/// Ordered so that serialization and iteration are deterministic.
pub type Record = BTreeMap<String, serde_json::Value>;
