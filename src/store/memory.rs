//! In-memory document store.
//!
//! Backs the inspection server and the test suite. Supports equality, range
//! and membership filters, multi-field ordering, cursor continuation,
//! atomic transactions with an operation quota, and an offline mode in which
//! commits queue until the network is re-enabled.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::types::{
    BatchOperation, Cursor, Direction, Document, Fields, Filter, FilterOp, OrderBy,
    QueryConstraints, QueryHit, QueryResponse,
};
use super::DocumentStore;
use crate::error::{StoreError, StoreResult};

/// Operation quota used by `MemoryStore::new`.
pub const DEFAULT_MAX_OPS: usize = 500;

type Collections = HashMap<String, BTreeMap<String, Fields>>;

#[derive(Debug)]
struct MemoryState {
    collections: Collections,
    online: bool,
    /// Batches committed while offline, applied on reconnect
    queued: Vec<Vec<BatchOperation>>,
    failing_reads: usize,
    failing_commits: usize,
}

/// Open transaction of a `MemoryStore`.
#[derive(Debug, Default)]
pub struct MemoryTransaction {
    ops: Vec<BatchOperation>,
}

impl MemoryTransaction {
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

// == Memory Store ==
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    max_ops: usize,
    latency: Option<Duration>,
    query_calls: AtomicUsize,
    get_calls: AtomicUsize,
    commits: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                collections: HashMap::new(),
                online: true,
                queued: Vec::new(),
                failing_reads: 0,
                failing_commits: 0,
            }),
            max_ops: DEFAULT_MAX_OPS,
            latency: None,
            query_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
            commits: AtomicUsize::new(0),
        }
    }

    /// Sets the per-transaction operation quota.
    pub fn with_max_ops(mut self, max_ops: usize) -> Self {
        self.max_ops = max_ops;
        self
    }

    /// Delays every async call, for exercising timeouts.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    // == Seeding & Inspection ==
    /// Inserts or replaces a document. Non-object values store no fields.
    pub fn insert(&self, collection: &str, id: &str, fields: Value) {
        let fields = match fields {
            Value::Object(map) => without_id(map),
            _ => Fields::new(),
        };
        self.lock()
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    pub fn document(&self, collection: &str, id: &str) -> Option<Document> {
        self.lock()
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone()))
    }

    pub fn count(&self, collection: &str) -> usize {
        self.lock()
            .collections
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    pub fn is_online(&self) -> bool {
        self.lock().online
    }

    pub fn queued_batches(&self) -> usize {
        self.lock().queued.len()
    }

    /// Makes the next `n` reads fail with `StoreError::Unavailable`.
    pub fn fail_next_reads(&self, n: usize) {
        self.lock().failing_reads = n;
    }

    /// Makes the next `n` commits fail with `StoreError::Unavailable`.
    pub fn fail_next_commits(&self, n: usize) {
        self.lock().failing_commits = n;
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(AtomicOrdering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(AtomicOrdering::SeqCst)
    }

    /// Number of confirmed commits.
    pub fn commits(&self) -> usize {
        self.commits.load(AtomicOrdering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn check_read(state: &mut MemoryState) -> StoreResult<()> {
        if state.failing_reads > 0 {
            state.failing_reads -= 1;
            return Err(StoreError::Unavailable("injected read failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    type Transaction = MemoryTransaction;

    async fn query(
        &self,
        collection: &str,
        constraints: &QueryConstraints,
        limit: usize,
        after: Option<&Cursor>,
    ) -> StoreResult<QueryResponse> {
        self.simulate_latency().await;
        self.query_calls.fetch_add(1, AtomicOrdering::SeqCst);

        let mut state = self.lock();
        Self::check_read(&mut state)?;

        let Some(docs) = state.collections.get(collection) else {
            return Ok(QueryResponse {
                hits: Vec::new(),
                total_estimate: Some(0),
            });
        };

        let mut matches: Vec<Document> = docs
            .iter()
            .map(|(id, fields)| Document::new(id.as_str(), fields.clone()))
            .filter(|doc| constraints.filters.iter().all(|f| matches_filter(doc, f)))
            .collect();
        let order_by = &constraints.order_by;
        matches.sort_by(|a, b| {
            compare_keys(
                &sort_values(a, order_by),
                &a.id,
                &sort_values(b, order_by),
                &b.id,
                order_by,
            )
        });
        let total = matches.len() as u64;

        let start = match after {
            None => 0,
            Some(cursor) => {
                let (values, id) = decode_cursor(cursor)?;
                matches
                    .iter()
                    .position(|doc| {
                        compare_keys(
                            &sort_values(doc, &constraints.order_by),
                            &doc.id,
                            &values,
                            &id,
                            &constraints.order_by,
                        ) == Ordering::Greater
                    })
                    .unwrap_or(matches.len())
            }
        };

        let hits = matches
            .into_iter()
            .skip(start)
            .take(limit)
            .map(|document| QueryHit {
                cursor: encode_cursor(&document, &constraints.order_by),
                document,
            })
            .collect();

        Ok(QueryResponse {
            hits,
            total_estimate: Some(total),
        })
    }

    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.simulate_latency().await;
        self.get_calls.fetch_add(1, AtomicOrdering::SeqCst);

        let mut state = self.lock();
        Self::check_read(&mut state)?;
        Ok(state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    fn begin_transaction(&self) -> MemoryTransaction {
        MemoryTransaction::default()
    }

    fn stage(&self, tx: &mut MemoryTransaction, op: BatchOperation) -> StoreResult<()> {
        tx.ops.push(op);
        Ok(())
    }

    async fn commit_transaction(&self, tx: &mut MemoryTransaction) -> StoreResult<()> {
        self.simulate_latency().await;

        let mut state = self.lock();
        if state.failing_commits > 0 {
            state.failing_commits -= 1;
            return Err(StoreError::Unavailable(
                "injected commit failure".to_string(),
            ));
        }
        if tx.ops.len() > self.max_ops {
            return Err(StoreError::QuotaExceeded {
                attempted: tx.ops.len(),
                limit: self.max_ops,
            });
        }

        let ops = std::mem::take(&mut tx.ops);
        if state.online {
            if let Err(err) = apply_batch(&mut state.collections, &ops) {
                tx.ops = ops;
                return Err(err);
            }
        } else {
            debug!(operations = ops.len(), "Offline, queueing batch");
            state.queued.push(ops);
        }

        self.commits.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(())
    }

    async fn set_network_mode(&self, enabled: bool) -> StoreResult<()> {
        self.simulate_latency().await;

        let mut state = self.lock();
        state.online = enabled;
        if enabled {
            let queued = std::mem::take(&mut state.queued);
            if !queued.is_empty() {
                info!(batches = queued.len(), "Applying batches queued while offline");
            }
            for ops in queued {
                if let Err(err) = apply_batch(&mut state.collections, &ops) {
                    warn!(error = %err, "Dropping queued batch rejected on reconnect");
                }
            }
        }
        Ok(())
    }
}

// == Batch Application ==
/// Applies `ops` all-or-nothing.
fn apply_batch(collections: &mut Collections, ops: &[BatchOperation]) -> StoreResult<()> {
    let mut next = collections.clone();
    for op in ops {
        match op {
            BatchOperation::Set { target, payload } => {
                next.entry(target.collection.clone())
                    .or_default()
                    .insert(target.id.clone(), without_id(payload.clone()));
            }
            BatchOperation::Update { target, payload } => {
                let existing = next
                    .get_mut(&target.collection)
                    .and_then(|docs| docs.get_mut(&target.id))
                    .ok_or_else(|| {
                        StoreError::Rejected(format!("update of missing document {}", target))
                    })?;
                let fields = payload.iter().filter(|(field, _)| field.as_str() != "id");
                for (field, value) in fields {
                    existing.insert(field.clone(), value.clone());
                }
            }
            BatchOperation::Delete { target } => {
                if let Some(docs) = next.get_mut(&target.collection) {
                    docs.remove(&target.id);
                }
            }
        }
    }
    *collections = next;
    Ok(())
}

/// The document id lives outside the field map; a stored `id` field would
/// shadow it once the document is flattened.
fn without_id(mut fields: Fields) -> Fields {
    fields.remove("id");
    fields
}

// == Filtering & Ordering ==
fn matches_filter(doc: &Document, filter: &Filter) -> bool {
    let Some(value) = doc.field(&filter.field) else {
        return false;
    };
    match filter.op {
        FilterOp::Eq => compare_values(value, &filter.value) == Ordering::Equal,
        FilterOp::Ne => compare_values(value, &filter.value) != Ordering::Equal,
        FilterOp::In => filter
            .value
            .as_array()
            .is_some_and(|candidates| {
                candidates
                    .iter()
                    .any(|c| compare_values(value, c) == Ordering::Equal)
            }),
        range => {
            if type_rank(value) != type_rank(&filter.value) {
                return false;
            }
            let ord = compare_values(value, &filter.value);
            match range {
                FilterOp::Lt => ord == Ordering::Less,
                FilterOp::Le => ord != Ordering::Greater,
                FilterOp::Gt => ord == Ordering::Greater,
                FilterOp::Ge => ord != Ordering::Less,
                _ => false,
            }
        }
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: by type first, then by content.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        _ if type_rank(a) != type_rank(b) => type_rank(a).cmp(&type_rank(b)),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn sort_values(doc: &Document, order_by: &[OrderBy]) -> Vec<Value> {
    order_by
        .iter()
        .map(|o| doc.field(&o.field).cloned().unwrap_or(Value::Null))
        .collect()
}

/// Orders two positions by the sort fields, then by id.
fn compare_keys(
    a_values: &[Value],
    a_id: &str,
    b_values: &[Value],
    b_id: &str,
    order_by: &[OrderBy],
) -> Ordering {
    for ((order, a), b) in order_by.iter().zip(a_values).zip(b_values) {
        let ord = match order.direction {
            Direction::Asc => compare_values(a, b),
            Direction::Desc => compare_values(b, a),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a_id.cmp(b_id)
}

// == Cursor Encoding ==
/// Cursor token: the JSON array of the sort values followed by the id.
fn encode_cursor(doc: &Document, order_by: &[OrderBy]) -> Cursor {
    let mut position = sort_values(doc, order_by);
    position.push(Value::String(doc.id.clone()));
    Cursor::new(Value::Array(position).to_string())
}

fn decode_cursor(cursor: &Cursor) -> StoreResult<(Vec<Value>, String)> {
    let malformed = || StoreError::Rejected("malformed cursor".to_string());
    let mut position: Vec<Value> =
        serde_json::from_str(cursor.as_str()).map_err(|_| malformed())?;
    match position.pop() {
        Some(Value::String(id)) => Ok((position, id)),
        _ => Err(malformed()),
    }
}
