//! Batch Writer Module
//!
//! Accumulates mutations into store transactions and splits them at the
//! store's per-transaction operation ceiling.
//!
//! Operations staged into one transaction commit atomically. When staging
//! crosses the ceiling the writer commits the full transaction first and
//! continues in a new one; operations on either side of that boundary are not
//! atomic with each other. Every such boundary is reported to the caller as a
//! `CommitReport`.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::store::{bounded, BatchOperation, DocumentStore};

// == Commit Report ==
/// A transaction confirmed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    /// 1-based index of this commit within the writer's lifetime
    pub sequence: u64,
    /// Operations committed atomically
    pub operations: usize,
    /// True when the ceiling forced the commit
    pub automatic: bool,
}

// == Batch Writer ==
/// Stages mutations and commits them in ceiling-sized transactions.
///
/// `pending_count` never exceeds `max_ops`. Methods take `&mut self`; share a
/// writer behind a `tokio::sync::Mutex` to keep the ceiling check and the
/// increment together.
pub struct BatchWriter<S: DocumentStore> {
    store: Arc<S>,
    /// Live transaction, opened lazily on the first stage
    live: Option<S::Transaction>,
    pending: usize,
    max_ops: usize,
    timeout: Option<Duration>,
    commits: u64,
}

impl<S: DocumentStore> BatchWriter<S> {
    // == Constructor ==
    /// Creates an idle writer. A `max_ops` of 0 is treated as 1.
    pub fn new(store: Arc<S>, max_ops: usize, timeout: Option<Duration>) -> Self {
        Self {
            store,
            live: None,
            pending: 0,
            max_ops: max_ops.max(1),
            timeout,
            commits: 0,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending
    }

    pub fn max_ops(&self) -> usize {
        self.max_ops
    }

    // == Stage ==
    /// Appends `op` to the live transaction.
    ///
    /// If the live transaction already holds `max_ops` operations it is
    /// committed first and its report returned; `op` then starts a new
    /// transaction. If that commit fails, `op` is not staged and the full
    /// transaction stays pending.
    pub async fn stage(&mut self, op: BatchOperation) -> Result<Option<CommitReport>> {
        let boundary = if self.pending >= self.max_ops {
            info!(
                operations = self.pending,
                "Operation ceiling reached, committing before staging more"
            );
            self.commit_live(true).await?
        } else {
            None
        };

        let store = &self.store;
        let tx = self.live.get_or_insert_with(|| store.begin_transaction());
        debug!(kind = op.kind(), target = %op.target(), "Staging operation");
        store.stage(tx, op)?;
        self.pending += 1;

        Ok(boundary)
    }

    // == Stage All ==
    /// Stages every operation, then commits the remainder.
    ///
    /// Returns one report per committed transaction, in order. On error the
    /// reports of transactions already committed are lost to the caller but
    /// the store keeps them; the writer keeps whatever was left pending.
    pub async fn stage_all<I>(&mut self, ops: I) -> Result<Vec<CommitReport>>
    where
        I: IntoIterator<Item = BatchOperation>,
    {
        let mut reports = Vec::new();
        for op in ops {
            if let Some(report) = self.stage(op).await? {
                reports.push(report);
            }
        }
        if let Some(report) = self.commit().await? {
            reports.push(report);
        }
        Ok(reports)
    }

    // == Commit ==
    /// Commits the live transaction. No-op when nothing is pending.
    pub async fn commit(&mut self) -> Result<Option<CommitReport>> {
        if self.pending == 0 {
            return Ok(None);
        }
        self.commit_live(false).await
    }

    // == Discard ==
    /// Drops the live transaction without committing it.
    ///
    /// Returns the number of operations discarded.
    pub fn discard(&mut self) -> usize {
        let dropped = self.pending;
        self.live = None;
        self.pending = 0;
        if dropped > 0 {
            warn!(operations = dropped, "Discarded uncommitted operations");
        }
        dropped
    }

    /// Commits and resets state only once the store confirms.
    async fn commit_live(&mut self, automatic: bool) -> Result<Option<CommitReport>> {
        let Some(tx) = self.live.as_mut() else {
            return Ok(None);
        };
        let operations = self.pending;

        if let Err(err) = bounded(
            self.timeout,
            "commit_transaction",
            self.store.commit_transaction(tx),
        )
        .await
        {
            if err.is_quota_violation() {
                error!(
                    operations,
                    max_ops = self.max_ops,
                    error = %err,
                    "Store rejected transaction size; writer ceiling exceeds the store quota"
                );
            } else {
                warn!(operations, error = %err, "Commit failed, operations remain pending");
            }
            return Err(err);
        }

        self.live = None;
        self.pending = 0;
        self.commits += 1;
        let report = CommitReport {
            sequence: self.commits,
            operations,
            automatic,
        };
        info!(
            sequence = report.sequence,
            operations, automatic, "Committed transaction"
        );
        Ok(Some(report))
    }
}

impl<S: DocumentStore> Drop for BatchWriter<S> {
    fn drop(&mut self) {
        if self.pending > 0 {
            warn!(
                operations = self.pending,
                "Batch writer dropped with uncommitted operations"
            );
        }
    }
}
