//! Contract definitions, sources and the caching registry.
//!
//! This module provides:
//! - [`ContractDefinition`] and [`FieldSpec`], the immutable parsed form
//! - [`ContractSource`], the abstract supplier of raw documents
//! - [`ContractRegistry`], the single-flight cache keyed by `(domain, version)`

mod definition;
mod registry;
mod source;

pub use definition::{
    ContractDefinition, ContractDocument, ContractKey, FieldDocument, FieldPattern, FieldSpec,
    InferenceBinding,
};
pub use registry::{compare_versions, ContractRegistry, LoadedContract};
pub use source::{ContractSource, DirectoryContractSource, InMemoryContractSource};
