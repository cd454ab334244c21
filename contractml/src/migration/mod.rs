//! Re-projection of validated data between contract versions.

use tracing::debug;

use crate::contracts::{ContractDefinition, FieldSpec};
use crate::core::Record;
use crate::pipeline::ExecutionResult;

/// Maps validated data produced under one contract version onto the fields of
/// another.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationResolver;

impl MigrationResolver {
    /// Creates a resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Builds a record for `target` from `older`'s validated data.
    ///
    /// Each target field takes the same-named value, else the first former
    /// name present in `renamed_from`, else the target default. Fields with
    /// none of these are left absent for the target's presence rules.
    #[must_use]
    pub fn migrate(&self, older: &ExecutionResult, target: &ContractDefinition) -> Record {
        let record: Record = target
            .fields
            .iter()
            .filter_map(|field| {
                resolve(field, &older.validated_data).map(|value| (field.name.clone(), value))
            })
            .collect();

        debug!(
            domain = %target.domain,
            from = %older.version,
            to = %target.version,
            fields = record.len(),
            "Migrated record"
        );
        record
    }
}

fn resolve(field: &FieldSpec, source: &Record) -> Option<serde_json::Value> {
    std::iter::once(&field.name)
        .chain(field.renamed_from.iter())
        .find_map(|name| source.get(name))
        .or(field.default.as_ref())
        .cloned()
}
