//! # ContractML
//!
//! A contract execution engine for ML feature records.
//!
//! A contract is a versioned, declarative description of a domain's fields:
//! types, ranges, repair policies and drift rules. The engine provides:
//!
//! - **Contract registry**: single-flight loading and caching of parsed
//!   contracts from a pluggable source
//! - **Field evaluation**: presence, coercion, constraint repair and drift
//!   detection as a pure function of a field spec and a value
//! - **Execution pipeline**: per-record evaluation with bounded-time
//!   inference through an injected collaborator
//! - **Migration**: re-projection of validated data between contract versions
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use contractml::prelude::*;
//!
//! let engine = ContractEngine::from_config(&EngineConfig::default(), source)
//!     .with_pipeline(ExecutionPipeline::default().with_inference(model));
//!
//! let result = engine.execute("telemetry", "v2", &record).await?;
//! if result.status.is_usable() {
//!     println!("{:?}", result.predictions);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod contracts;
pub mod core;
pub mod engine;
pub mod errors;
pub mod evaluator;
pub mod events;
pub mod migration;
pub mod observability;
pub mod pipeline;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{EngineConfig, LoggingConfig, PipelineConfig, RegistryConfig};
    pub use crate::contracts::{
        ContractDefinition, ContractKey, ContractRegistry, ContractSource,
        DirectoryContractSource, FieldSpec, InMemoryContractSource, InferenceBinding,
    };
    pub use crate::core::{
        DriftKind, DriftPolicy, ExecutionStatus, FieldType, Record, RepairPolicy,
    };
    pub use crate::engine::ContractEngine;
    pub use crate::errors::{
        ConfigError, ContractError, ContractErrorInfo, ContractMlError, InferenceError,
        SourceError,
    };
    pub use crate::evaluator::{FieldError, FieldErrorKind, FieldResult};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::migration::MigrationResolver;
    pub use crate::observability::init_tracing;
    pub use crate::pipeline::{
        ExecutionError, ExecutionErrorKind, ExecutionPipeline, ExecutionResult,
        InferenceCollaborator, InferenceRequest, Predictions,
    };
}
