//! Data Access Module
//!
//! Cache-aware reads in front of a `DocumentStore`: single-document fetches,
//! bounded queries, cursor pagination and identity preloading.
//!
//! Every read consults the shared `CacheStore` first and only writes to it
//! after the store confirmed a result, so a failed, timed-out or dropped call
//! leaves the cache untouched. The cache lock is never held across a store
//! call.

mod documents;
mod pages;
mod preload;
mod query;

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::batch::BatchWriter;
use crate::cache::{CacheKey, CacheStats, CacheStore, PutOutcome, SizeGuard};
use crate::config::Config;
use crate::network::NetworkModeSwitch;
use crate::store::{Cursor, DocRef, Document, DocumentStore};

pub use preload::PreloadSummary;

/// Cache shared by every handle of one application root.
pub type SharedCache = Arc<RwLock<CacheStore<CachedValue>>>;

// == Cached Value ==
/// Payloads the access layer keeps in its cache.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CachedValue {
    Document(Document),
    /// Remembered "not found", only with negative caching enabled
    MissingDocument,
    Documents(Vec<Document>),
    Page(PaginatedResult<Document>),
}

// == Paginated Result ==
/// One page of an ordered result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    /// Pass back to fetch the next page; `None` when the page is empty
    pub cursor: Option<Cursor>,
    pub has_more: bool,
    pub total_estimate: Option<u64>,
}

impl PaginatedResult<Document> {
    /// Maps every item into an application type, keeping page metadata.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<PaginatedResult<T>, serde_json::Error> {
        Ok(PaginatedResult {
            items: decode_all(&self.items)?,
            cursor: self.cursor.clone(),
            has_more: self.has_more,
            total_estimate: self.total_estimate,
        })
    }
}

pub(crate) fn decode_all<T: DeserializeOwned>(docs: &[Document]) -> Result<Vec<T>, serde_json::Error> {
    docs.iter().map(Document::decode).collect()
}

/// Clamps a requested size into `[1, cap]`.
pub fn clamp_to_cap(requested: usize, cap: usize) -> usize {
    requested.clamp(1, cap.max(1))
}

// == Data Access ==
/// Entry point for application reads.
///
/// Cloning is cheap; clones share the store and the cache.
pub struct DataAccess<S: DocumentStore> {
    store: Arc<S>,
    cache: SharedCache,
    config: Arc<Config>,
    guard: SizeGuard,
    /// Prefix partitioning cache keys by identity
    namespace: Option<String>,
}

impl<S: DocumentStore> Clone for DataAccess<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            config: Arc::clone(&self.config),
            guard: self.guard,
            namespace: self.namespace.clone(),
        }
    }
}

impl<S: DocumentStore> DataAccess<S> {
    // == Constructors ==
    /// Creates a handle over an existing shared cache.
    pub fn new(store: Arc<S>, cache: SharedCache, config: Config) -> Self {
        Self {
            store,
            cache,
            guard: SizeGuard::new(config.size_warn_threshold_bytes),
            config: Arc::new(config),
            namespace: None,
        }
    }

    /// Creates a handle with a fresh cache sized from `config`.
    pub fn from_config(store: Arc<S>, config: Config) -> Self {
        let cache = Arc::new(RwLock::new(CacheStore::from_config(&config)));
        Self::new(store, cache, config)
    }

    /// Returns a handle whose cache keys are partitioned by `identity`.
    ///
    /// The handle shares this handle's store and cache; only its keys differ,
    /// so entries cached for one identity are never served to another.
    pub fn for_identity(&self, identity: impl Into<String>) -> Self {
        Self {
            namespace: Some(identity.into()),
            ..self.clone()
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    // == Cache Maintenance ==
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }

    /// Drops every cached entry. Returns the number removed.
    pub async fn clear_cache(&self) -> usize {
        self.cache.write().await.clear()
    }

    /// Drops the cached single-document reads of `targets` in this handle's
    /// partition. Returns the number of entries removed.
    ///
    /// Cached query results and pages are left to expire.
    pub async fn invalidate_documents<'a, I>(&self, targets: I) -> usize
    where
        I: IntoIterator<Item = &'a DocRef>,
    {
        let mut cache = self.cache.write().await;
        targets
            .into_iter()
            .filter(|target| {
                cache.invalidate(&CacheKey::document(
                    self.namespace(),
                    &target.collection,
                    &target.id,
                ))
            })
            .count()
    }

    // == Writers & Switches ==
    /// Creates a batch writer bound to this handle's store.
    pub fn batch_writer(&self) -> BatchWriter<S> {
        BatchWriter::new(
            Arc::clone(&self.store),
            self.config.server_max_ops,
            self.timeout(),
        )
    }

    pub fn network(&self) -> NetworkModeSwitch<S> {
        NetworkModeSwitch::new(Arc::clone(&self.store), self.timeout())
    }

    // == Internal Helpers ==
    fn timeout(&self) -> Option<Duration> {
        self.config.store_timeout()
    }

    async fn cached(&self, key: &CacheKey) -> Option<CachedValue> {
        self.cache.write().await.get(key)
    }

    async fn remember(&self, key: CacheKey, value: CachedValue) -> PutOutcome {
        self.cache.write().await.put(key, value)
    }
}
