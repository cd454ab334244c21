//! Contract registry: loads, caches and versions contract definitions.
//!
//! Each cache entry is a shared load future. The first caller for a cold key
//! inserts it; concurrent callers clone and await the same future, so a key
//! is fetched and parsed exactly once and every waiter observes the same
//! `Arc` or the same error. Failed loads are evicted once settled so the next
//! call retries. The map shard lock is never held across an await.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::{ContractDefinition, ContractKey, ContractSource};
use crate::config::RegistryConfig;
use crate::errors::{ContractError, SourceError};

type LoadFuture = Shared<BoxFuture<'static, Result<Loaded, ContractError>>>;

/// A settled load, stamped when parsing finished so the TTL excludes source
/// latency.
#[derive(Clone)]
struct Loaded {
    contract: Arc<ContractDefinition>,
    settled_at: Instant,
    loaded_at: DateTime<Utc>,
}

struct CacheSlot {
    load: LoadFuture,
}

/// Introspection record for a cached contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedContract {
    /// Contract domain.
    pub domain: String,
    /// Contract version.
    pub version: String,
    /// Fingerprint of the source document.
    pub fingerprint: String,
    /// Number of declared fields.
    pub field_count: usize,
    /// When the load settled.
    pub loaded_at: DateTime<Utc>,
}

/// Owned cache of contract definitions keyed by `(domain, version)`.
pub struct ContractRegistry {
    source: Arc<dyn ContractSource>,
    entries: DashMap<ContractKey, CacheSlot>,
    config: RegistryConfig,
}

impl ContractRegistry {
    /// Creates a registry over `source` with no cache expiry.
    #[must_use]
    pub fn new(source: Arc<dyn ContractSource>) -> Self {
        Self::with_config(source, RegistryConfig::default())
    }

    /// Creates a registry with explicit configuration.
    #[must_use]
    pub fn with_config(source: Arc<dyn ContractSource>, config: RegistryConfig) -> Self {
        Self {
            source,
            entries: DashMap::new(),
            config,
        }
    }

    /// Loads the contract for `domain`/`version`, fetching it on first use.
    pub async fn load(
        &self,
        domain: &str,
        version: &str,
    ) -> Result<Arc<ContractDefinition>, ContractError> {
        let key = ContractKey::new(domain, version);
        let load = self.slot_for(&key);
        let result = load.clone().await;

        if result.is_err() {
            let evicted = self
                .entries
                .remove_if(&key, |_, slot| slot.load.ptr_eq(&load))
                .is_some();
            if evicted {
                debug!(domain, version, "Evicted failed contract load");
            }
        }

        result.map(|loaded| loaded.contract)
    }

    /// Returns the cached contract without loading it.
    #[must_use]
    pub fn get_cached(&self, domain: &str, version: &str) -> Option<Arc<ContractDefinition>> {
        let slot = self.entries.get(&ContractKey::new(domain, version))?;
        match slot.load.peek() {
            Some(Ok(loaded)) if !self.is_expired(&slot) => Some(Arc::clone(&loaded.contract)),
            _ => None,
        }
    }

    /// Drops the cached entry for `domain`/`version`, returning true if one existed.
    pub fn invalidate(&self, domain: &str, version: &str) -> bool {
        let removed = self
            .entries
            .remove(&ContractKey::new(domain, version))
            .is_some();
        if removed {
            info!(domain, version, "Contract cache entry invalidated");
        }
        removed
    }

    /// Drops every cached entry.
    pub fn invalidate_all(&self) {
        let count = self.entries.len();
        self.entries.clear();
        info!(count, "Contract cache cleared");
    }

    /// Lists successfully loaded contracts, sorted by key.
    #[must_use]
    pub fn list_loaded(&self) -> Vec<LoadedContract> {
        let mut loaded: Vec<LoadedContract> = self
            .entries
            .iter()
            .filter_map(|entry| match entry.value().load.peek() {
                Some(Ok(Loaded {
                    contract,
                    loaded_at,
                    ..
                })) => Some(LoadedContract {
                    domain: contract.domain.clone(),
                    version: contract.version.clone(),
                    fingerprint: contract.fingerprint.clone(),
                    field_count: contract.fields.len(),
                    loaded_at: *loaded_at,
                }),
                _ => None,
            })
            .collect();
        loaded.sort_by(|a, b| (&a.domain, &a.version).cmp(&(&b.domain, &b.version)));
        loaded
    }

    /// Returns the number of cache entries, including in-flight loads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lists every contract the source can serve.
    pub async fn available(&self) -> Result<Vec<ContractKey>, ContractError> {
        let mut keys = self
            .source
            .list()
            .await
            .map_err(|err| ContractError::source_failure("*", "*", err.to_string()))?;
        keys.sort();
        Ok(keys)
    }

    /// Lists the versions available for `domain`, oldest first.
    pub async fn versions(&self, domain: &str) -> Result<Vec<String>, ContractError> {
        let mut versions: Vec<String> = self
            .available()
            .await?
            .into_iter()
            .filter(|key| key.domain == domain)
            .map(|key| key.version)
            .collect();
        versions.sort_by(|a, b| compare_versions(a, b));
        versions.dedup();
        Ok(versions)
    }

    /// Returns the newest version available for `domain`.
    pub async fn latest_version(&self, domain: &str) -> Result<Option<String>, ContractError> {
        Ok(self.versions(domain).await?.pop())
    }

    fn slot_for(&self, key: &ContractKey) -> LoadFuture {
        match self.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                if self.is_expired(occupied.get()) {
                    debug!(domain = %key.domain, version = %key.version, "Contract cache entry expired");
                    let slot = self.new_slot(key);
                    let load = slot.load.clone();
                    occupied.insert(slot);
                    load
                } else {
                    debug!(domain = %key.domain, version = %key.version, "Contract cache hit");
                    occupied.get().load.clone()
                }
            }
            Entry::Vacant(vacant) => {
                let slot = self.new_slot(key);
                let load = slot.load.clone();
                vacant.insert(slot);
                load
            }
        }
    }

    fn new_slot(&self, key: &ContractKey) -> CacheSlot {
        let source = Arc::clone(&self.source);
        let key = key.clone();
        let load = async move {
            let contract = fetch_and_parse(source.as_ref(), &key).await?;
            Ok::<_, ContractError>(Loaded {
                contract,
                settled_at: Instant::now(),
                loaded_at: Utc::now(),
            })
        }
        .boxed()
        .shared();
        CacheSlot { load }
    }

    fn is_expired(&self, slot: &CacheSlot) -> bool {
        match (self.config.cache_ttl(), slot.load.peek()) {
            (Some(ttl), Some(Ok(loaded))) => loaded.settled_at.elapsed() >= ttl,
            _ => false,
        }
    }
}

impl std::fmt::Debug for ContractRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractRegistry")
            .field("entries", &self.entries.len())
            .field("config", &self.config)
            .finish()
    }
}

async fn fetch_and_parse(
    source: &dyn ContractSource,
    key: &ContractKey,
) -> Result<Arc<ContractDefinition>, ContractError> {
    info!(domain = %key.domain, version = %key.version, "Loading contract");

    let document = source
        .fetch(&key.domain, &key.version)
        .await
        .map_err(|err| match err {
            SourceError::NotFound => ContractError::not_found(&key.domain, &key.version),
            SourceError::Malformed(reason) => {
                ContractError::parse(&key.domain, &key.version, reason)
            }
            SourceError::Io(reason) => {
                ContractError::source_failure(&key.domain, &key.version, reason)
            }
        })?;

    let contract = ContractDefinition::parse(&key.domain, &key.version, &document)?;
    debug!(
        domain = %key.domain,
        version = %key.version,
        fields = contract.fields.len(),
        fingerprint = %contract.fingerprint,
        "Contract parsed"
    );
    Ok(Arc::new(contract))
}

/// Orders versions by their numeric part (`v2 < v10`), falling back to
/// lexical order. Non-numeric versions sort before numeric ones.
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (version_number(a), version_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

fn version_number(version: &str) -> Option<u64> {
    version
        .strip_prefix(['v', 'V'])
        .unwrap_or(version)
        .parse()
        .ok()
}
