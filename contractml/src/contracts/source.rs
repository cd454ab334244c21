//! Contract sources: where raw contract documents come from.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::ContractKey;
use crate::errors::SourceError;

/// Supplies raw contract documents to the registry.
///
/// The registry only depends on this shape; file formats and transports are
/// the implementor's concern.
#[async_trait]
pub trait ContractSource: Send + Sync {
    /// Fetches the raw document for `domain`/`version`.
    async fn fetch(&self, domain: &str, version: &str) -> Result<Value, SourceError>;

    /// Lists every key the source can serve.
    async fn list(&self) -> Result<Vec<ContractKey>, SourceError> {
        Ok(Vec::new())
    }
}

/// A source backed by documents held in memory.
#[derive(Debug, Default)]
pub struct InMemoryContractSource {
    documents: RwLock<BTreeMap<ContractKey, Value>>,
}

impl InMemoryContractSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document, builder style.
    #[must_use]
    pub fn with_contract(
        self,
        domain: impl Into<String>,
        version: impl Into<String>,
        document: Value,
    ) -> Self {
        self.insert(domain, version, document);
        self
    }

    /// Inserts or replaces a document.
    pub fn insert(&self, domain: impl Into<String>, version: impl Into<String>, document: Value) {
        self.documents
            .write()
            .insert(ContractKey::new(domain, version), document);
    }

    /// Removes a document, returning true if it existed.
    pub fn remove(&self, domain: &str, version: &str) -> bool {
        self.documents
            .write()
            .remove(&ContractKey::new(domain, version))
            .is_some()
    }

    /// Returns the number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Returns true if the source holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

#[async_trait]
impl ContractSource for InMemoryContractSource {
    async fn fetch(&self, domain: &str, version: &str) -> Result<Value, SourceError> {
        self.documents
            .read()
            .get(&ContractKey::new(domain, version))
            .cloned()
            .ok_or(SourceError::NotFound)
    }

    async fn list(&self) -> Result<Vec<ContractKey>, SourceError> {
        Ok(self.documents.read().keys().cloned().collect())
    }
}

/// A source reading JSON documents laid out as `<root>/<domain>/<version>.json`.
#[derive(Debug, Clone)]
pub struct DirectoryContractSource {
    root: PathBuf,
}

impl DirectoryContractSource {
    /// Extension of contract documents.
    pub const EXTENSION: &'static str = "json";

    /// Creates a source rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, domain: &str, version: &str) -> Option<PathBuf> {
        if !is_safe_segment(domain) || !is_safe_segment(version) {
            return None;
        }
        Some(
            self.root
                .join(domain)
                .join(format!("{version}.{}", Self::EXTENSION)),
        )
    }
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\'])
}

#[async_trait]
impl ContractSource for DirectoryContractSource {
    async fn fetch(&self, domain: &str, version: &str) -> Result<Value, SourceError> {
        let path = self
            .document_path(domain, version)
            .ok_or(SourceError::NotFound)?;

        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound);
            }
            Err(err) => return Err(SourceError::Io(format!("{}: {err}", path.display()))),
        };

        tracing::debug!(path = %path.display(), "Read contract document");
        serde_json::from_str(&text).map_err(|err| SourceError::Malformed(err.to_string()))
    }

    async fn list(&self) -> Result<Vec<ContractKey>, SourceError> {
        let mut keys = Vec::new();

        let mut domains = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %self.root.display(), "Contracts directory not found");
                return Ok(keys);
            }
            Err(err) => return Err(SourceError::Io(err.to_string())),
        };

        while let Some(domain_entry) = domains
            .next_entry()
            .await
            .map_err(|err| SourceError::Io(err.to_string()))?
        {
            let domain_path = domain_entry.path();
            if !domain_path.is_dir() {
                continue;
            }
            let Some(domain) = domain_path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let mut versions = tokio::fs::read_dir(&domain_path)
                .await
                .map_err(|err| SourceError::Io(err.to_string()))?;
            while let Some(version_entry) = versions
                .next_entry()
                .await
                .map_err(|err| SourceError::Io(err.to_string()))?
            {
                let path = version_entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some(Self::EXTENSION) {
                    continue;
                }
                if let Some(version) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(ContractKey::new(domain, version));
                }
            }
        }

        keys.sort();
        tracing::debug!(count = keys.len(), "Listed available contracts");
        Ok(keys)
    }
}
