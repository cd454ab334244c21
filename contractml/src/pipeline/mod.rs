//! Contract execution.
//!
//! This module provides:
//! - [`ExecutionPipeline`], which evaluates a record against a contract and
//!   invokes inference under a timeout
//! - [`ExecutionResult`], the structured per-call outcome
//! - [`InferenceCollaborator`], the narrow contract to the model runtime

mod executor;
mod inference;
#[cfg(test)]
mod integration_tests;
mod result;

pub use executor::{compute_status, ExecutionPipeline};
pub use inference::{InferenceCollaborator, InferenceRequest, Predictions};
pub use result::{ExecutionError, ExecutionErrorKind, ExecutionResult};
