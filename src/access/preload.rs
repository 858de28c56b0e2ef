//! Cache warming for a known identity.

use serde::Serialize;
use tracing::info;

use super::DataAccess;
use crate::error::Result;
use crate::store::{Document, DocumentStore, QueryConstraints};

/// What a `preload` call put in front of the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreloadSummary {
    pub profile_found: bool,
    pub pages_loaded: usize,
    pub items_loaded: usize,
}

impl<S: DocumentStore> DataAccess<S> {
    // == Preload ==
    /// Warms the cache for `identity`.
    ///
    /// Fetches the identity's profile document and the first page of each
    /// owned collection, filtered on the configured owner field. The reads go
    /// through this handle, so a handle from `for_identity` warms that
    /// identity's partition. The first store error aborts the preload.
    pub async fn preload(&self, identity: &str) -> Result<PreloadSummary> {
        let mut summary = PreloadSummary::default();

        let profile: Option<Document> = self
            .get_by_id(&self.config.preload_profile_collection, identity)
            .await?;
        summary.profile_found = profile.is_some();

        for collection in &self.config.preload_owned_collections {
            let constraints =
                QueryConstraints::new().where_eq(self.config.preload_owner_field.as_str(), identity);
            let page = self
                .fetch_page::<Document>(collection, &constraints, None, None)
                .await?;
            summary.pages_loaded += 1;
            summary.items_loaded += page.items.len();
        }

        info!(
            identity,
            profile_found = summary.profile_found,
            pages = summary.pages_loaded,
            items = summary.items_loaded,
            "Preload complete"
        );
        Ok(summary)
    }
}
