//! Bounded bulk queries with optional caching.

use serde::de::DeserializeOwned;
use tracing::debug;

use super::{clamp_to_cap, decode_all, CachedValue, DataAccess};
use crate::cache::CacheKey;
use crate::error::Result;
use crate::store::{bounded, Document, DocumentStore, QueryConstraints};

impl<S: DocumentStore> DataAccess<S> {
    // == Run Query ==
    /// Runs a limited query and returns its matches in order.
    ///
    /// `max_results` defaults to `default_query_limit` and is clamped to
    /// `[1, hard_cap_query_limit]`. With `cache_enabled` false the cache is
    /// neither read nor written, but the size guard still inspects the result.
    pub async fn run_query<T: DeserializeOwned>(
        &self,
        collection: &str,
        constraints: &QueryConstraints,
        max_results: Option<usize>,
        cache_enabled: bool,
    ) -> Result<Vec<T>> {
        let limit = clamp_to_cap(
            max_results.unwrap_or(self.config.default_query_limit),
            self.config.hard_cap_query_limit,
        );
        let key = CacheKey::query(self.namespace(), collection, constraints, limit);

        if cache_enabled {
            if let Some(CachedValue::Documents(docs)) = self.cached(&key).await {
                debug!(collection, limit, "Query cache hit");
                return Ok(decode_all(&docs)?);
            }
        }

        let response = bounded(
            self.timeout(),
            "query",
            self.store.query(collection, constraints, limit, None),
        )
        .await?;

        let docs: Vec<Document> = response
            .hits
            .into_iter()
            .take(limit)
            .map(|hit| hit.document)
            .collect();
        let items = decode_all(&docs)?;

        if cache_enabled {
            self.remember(key, CachedValue::Documents(docs)).await;
        } else if let Ok(size_bytes) = self.guard.estimate(&docs) {
            self.guard.check_and_warn(size_bytes, collection);
        }

        Ok(items)
    }
}
