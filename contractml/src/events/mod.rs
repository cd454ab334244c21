//! Execution events.
//!
//! The pipeline reports lifecycle events to an injected [`EventSink`]. Sinks
//! are fire-and-forget: emitting never fails and never alters a result.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// Event type names emitted by the execution pipeline.
pub mod names {
    /// A contract finished executing against a record.
    pub const PIPELINE_COMPLETED: &str = "pipeline.completed";
    /// At least one field drifted from its baseline.
    pub const DRIFT_DETECTED: &str = "drift.detected";
    /// The inference collaborator failed or timed out.
    pub const INFERENCE_FAILED: &str = "inference.failed";
}
