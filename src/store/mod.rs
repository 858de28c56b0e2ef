//! Document Store Module
//!
//! The narrow interface this layer consumes from the remote document store,
//! plus an in-memory implementation.

mod memory;
mod types;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{DataError, Result, StoreResult};

pub use memory::MemoryStore;
pub use types::{
    BatchOperation, Cursor, Direction, DocRef, Document, Fields, Filter, FilterOp, OrderBy,
    QueryConstraints, QueryHit, QueryResponse,
};

// == Document Store ==
/// Operations required from the external document store.
///
/// The async methods are the only suspension points of the layer. Staging
/// into a transaction is local bookkeeping and stays synchronous.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Handle for one open transaction.
    type Transaction: Send;

    /// Returns up to `limit` matches ordered per `constraints`, starting
    /// strictly after `after` when given.
    async fn query(
        &self,
        collection: &str,
        constraints: &QueryConstraints,
        limit: usize,
        after: Option<&Cursor>,
    ) -> StoreResult<QueryResponse>;

    /// Fetches one document; `Ok(None)` when it does not exist.
    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    fn begin_transaction(&self) -> Self::Transaction;

    fn stage(&self, tx: &mut Self::Transaction, op: BatchOperation) -> StoreResult<()>;

    /// Commits every staged operation atomically.
    ///
    /// Fails with `StoreError::QuotaExceeded` when the transaction holds more
    /// operations than the store allows. The handle is borrowed so a failed or
    /// cancelled commit leaves it with the caller.
    async fn commit_transaction(&self, tx: &mut Self::Transaction) -> StoreResult<()>;

    /// Enables or disables network access for the store client.
    async fn set_network_mode(&self, enabled: bool) -> StoreResult<()>;
}

/// Awaits a store call, bounded by `timeout` when one is set.
///
/// A timed-out call is dropped; nothing after it runs, so callers that only
/// touch local state after a confirmed response stay unmodified.
pub(crate) async fn bounded<T, F>(
    timeout: Option<Duration>,
    operation: &'static str,
    call: F,
) -> Result<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match timeout {
        None => Ok(call.await?),
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(DataError::Timeout {
                operation,
                after_ms: limit.as_millis() as u64,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[tokio::test]
    async fn test_bounded_without_timeout() {
        let value = bounded(None, "noop", async { Ok::<_, StoreError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_bounded_passes_store_errors_through() {
        let result: Result<()> = bounded(Some(Duration::from_secs(1)), "query", async {
            Err(StoreError::Unavailable("down".into()))
        })
        .await;
        assert!(matches!(
            result,
            Err(DataError::Store(StoreError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let result: Result<()> = bounded(Some(Duration::from_millis(20)), "query", async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(())
        })
        .await;
        assert!(matches!(
            result,
            Err(DataError::Timeout {
                operation: "query",
                after_ms: 20
            })
        ));
    }
}
