//! The contract engine facade.
//!
//! [`ContractEngine`] ties the registry, the execution pipeline and the
//! migration resolver together behind `domain`/`version` lookups.

use std::sync::Arc;
use tracing::info;

use crate::config::EngineConfig;
use crate::contracts::{ContractRegistry, ContractSource, DirectoryContractSource};
use crate::core::Record;
use crate::errors::{ConfigError, ContractError, ContractMlError};
use crate::migration::MigrationResolver;
use crate::pipeline::{ExecutionPipeline, ExecutionResult};

/// Executes records against contracts resolved by domain and version.
#[derive(Debug, Clone)]
pub struct ContractEngine {
    registry: Arc<ContractRegistry>,
    pipeline: ExecutionPipeline,
    resolver: MigrationResolver,
}

impl ContractEngine {
    /// Creates an engine from its parts.
    #[must_use]
    pub fn new(registry: Arc<ContractRegistry>, pipeline: ExecutionPipeline) -> Self {
        Self {
            registry,
            pipeline,
            resolver: MigrationResolver::new(),
        }
    }

    /// Creates an engine over `source` configured by `config`.
    #[must_use]
    pub fn from_config(config: &EngineConfig, source: Arc<dyn ContractSource>) -> Self {
        let registry = ContractRegistry::with_config(source, config.registry.clone());
        let pipeline = ExecutionPipeline::new(config.pipeline.clone());
        Self::new(Arc::new(registry), pipeline)
    }

    /// Creates an engine reading contracts from `config.contracts_path`.
    pub fn from_directory_config(config: &EngineConfig) -> Result<Self, ContractMlError> {
        config.validate()?;
        let root = config
            .contracts_path
            .clone()
            .ok_or_else(|| ConfigError::Missing("contracts_path".to_string()))?;
        info!(path = %root.display(), "Using contract directory");
        Ok(Self::from_config(
            config,
            Arc::new(DirectoryContractSource::new(root)),
        ))
    }

    /// Replaces the execution pipeline, e.g. to attach inference.
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: ExecutionPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// The contract registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ContractRegistry> {
        &self.registry
    }

    /// The execution pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &ExecutionPipeline {
        &self.pipeline
    }

    /// Loads `domain`/`version` and executes `record` against it.
    pub async fn execute(
        &self,
        domain: &str,
        version: &str,
        record: &Record,
    ) -> Result<ExecutionResult, ContractError> {
        let contract = self.registry.load(domain, version).await?;
        Ok(self.pipeline.execute(&contract, record).await)
    }

    /// Executes `record` against `version`, then migrates and re-executes it
    /// against `target_version`.
    ///
    /// The target defaults to the latest available version of `domain`. A
    /// failed source execution is returned unchanged.
    pub async fn execute_with_migration(
        &self,
        domain: &str,
        version: &str,
        record: &Record,
        target_version: Option<&str>,
    ) -> Result<ExecutionResult, ContractError> {
        let target_version = match target_version {
            Some(target) => target.to_string(),
            None => self
                .registry
                .latest_version(domain)
                .await?
                .ok_or_else(|| ContractError::not_found(domain, "latest"))?,
        };

        if target_version == version {
            return self.execute(domain, version, record).await;
        }

        let source = self.execute(domain, version, record).await?;
        if source.status.is_failure() {
            return Ok(source);
        }

        let target = self.registry.load(domain, &target_version).await?;
        let migrated = self.resolver.migrate(&source, &target);
        let mut result = self.pipeline.execute(&target, &migrated).await;
        result.migrated_from = Some(version.to_string());
        Ok(result)
    }

    /// Executes `record` against `from` and re-projects its validated data
    /// onto `to` without executing the target.
    pub async fn migrate(
        &self,
        domain: &str,
        from: &str,
        to: &str,
        record: &Record,
    ) -> Result<Record, ContractError> {
        let source_contract = self.registry.load(domain, from).await?;
        let target = self.registry.load(domain, to).await?;
        let source = ExecutionPipeline::evaluate_record(&source_contract, record);
        Ok(self.resolver.migrate(&source, &target))
    }
}
