//! Cursor-based pagination.

use serde::de::DeserializeOwned;
use tracing::debug;

use super::{clamp_to_cap, CachedValue, DataAccess, PaginatedResult};
use crate::cache::CacheKey;
use crate::error::Result;
use crate::store::{bounded, Cursor, Document, DocumentStore, QueryConstraints};

impl<S: DocumentStore> DataAccess<S> {
    // == Fetch Page ==
    /// Fetches one page of an ordered query.
    ///
    /// `page_size` defaults to `default_page_size` and is clamped to
    /// `[1, hard_cap_page_size]`. Pass `None` as `cursor` for the first page
    /// and the returned `cursor` for each following page; pages of one query
    /// must be fetched in sequence.
    ///
    /// One extra item is requested to learn whether more pages follow; it is
    /// never returned.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        collection: &str,
        constraints: &QueryConstraints,
        cursor: Option<&Cursor>,
        page_size: Option<usize>,
    ) -> Result<PaginatedResult<T>> {
        let page_size = clamp_to_cap(
            page_size.unwrap_or(self.config.default_page_size),
            self.config.hard_cap_page_size,
        );
        let key = CacheKey::page(self.namespace(), collection, constraints, cursor, page_size);

        if let Some(CachedValue::Page(page)) = self.cached(&key).await {
            debug!(collection, page_size, "Page cache hit");
            return Ok(page.decode()?);
        }

        let response = bounded(
            self.timeout(),
            "query",
            self.store
                .query(collection, constraints, page_size + 1, cursor),
        )
        .await?;

        let mut hits = response.hits;
        let has_more = hits.len() > page_size;
        hits.truncate(page_size);

        let next_cursor = hits.last().map(|hit| hit.cursor.clone());
        let page = PaginatedResult {
            items: hits.into_iter().map(|hit| hit.document).collect::<Vec<Document>>(),
            cursor: next_cursor,
            has_more,
            total_estimate: response.total_estimate,
        };
        let decoded = page.decode()?;

        debug!(
            collection,
            page_size,
            returned = page.items.len(),
            has_more,
            "Fetched page from store"
        );
        self.remember(key, CachedValue::Page(page)).await;

        Ok(decoded)
    }
}
