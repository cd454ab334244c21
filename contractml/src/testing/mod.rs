//! Testing utilities for contractml.
//!
//! This module provides:
//! - Contract fixtures (`telemetry` v1/v2, `fraud` v1)
//! - Mock inference collaborators
//! - A counting contract source for cache tests

pub mod fixtures;
pub mod mocks;

pub use mocks::{CountingSource, FailingInference, SlowInference, StaticInference};
