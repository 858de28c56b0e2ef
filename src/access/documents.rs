//! Single-document fetch-or-cache.

use serde::de::DeserializeOwned;
use tracing::debug;

use super::{CachedValue, DataAccess};
use crate::cache::CacheKey;
use crate::error::Result;
use crate::store::{bounded, DocumentStore};

impl<S: DocumentStore> DataAccess<S> {
    // == Get By Id ==
    /// Fetches one document, serving it from the cache when fresh.
    ///
    /// A missing document is `Ok(None)`. It is only remembered when
    /// `cache_negative_lookups` is enabled; otherwise every lookup of a missing
    /// id reaches the store.
    pub async fn get_by_id<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>> {
        let key = CacheKey::document(self.namespace(), collection, id);

        match self.cached(&key).await {
            Some(CachedValue::Document(doc)) => {
                debug!(collection, id, "Document cache hit");
                return Ok(Some(doc.decode()?));
            }
            Some(CachedValue::MissingDocument) => {
                debug!(collection, id, "Negative cache hit");
                return Ok(None);
            }
            _ => {}
        }

        let fetched = bounded(
            self.timeout(),
            "get_document",
            self.store.get_document(collection, id),
        )
        .await?;

        match fetched {
            Some(doc) => {
                let value = doc.decode()?;
                self.remember(key, CachedValue::Document(doc)).await;
                Ok(Some(value))
            }
            None => {
                if self.config.cache_negative_lookups {
                    self.remember(key, CachedValue::MissingDocument).await;
                }
                Ok(None)
            }
        }
    }
}
