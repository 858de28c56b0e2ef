//! Types exchanged with the document store.

use std::fmt::{self, Write as _};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field map of a document.
pub type Fields = Map<String, Value>;

// == Document ==
/// A document as returned by the store: its id plus its fields.
///
/// Serializes flat, with `id` next to the fields. `fields` must not contain
/// an `id` key; stores drop it on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Maps the document into an application type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(serde_json::to_value(self)?)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

// == Cursor ==
/// Opaque position in an ordered result set.
///
/// Only stores mint cursors; callers pass back the cursor a page returned to
/// fetch the page after it and must not build or inspect one.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Wraps a store-specific position token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.0).finish()
    }
}

// == Query Result ==
/// One query match together with the cursor positioned right after it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryHit {
    pub document: Document,
    pub cursor: Cursor,
}

/// Ordered matches for one store query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    pub hits: Vec<QueryHit>,
    /// Total number of matches, when the store can tell cheaply
    pub total_estimate: Option<u64>,
}

// == Constraints ==
/// Comparison applied by a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Field value is one of the elements of an array operand
    In,
}

impl FilterOp {
    pub fn symbol(self) -> &'static str {
        match self {
            FilterOp::Eq => "==",
            FilterOp::Ne => "!=",
            FilterOp::Lt => "<",
            FilterOp::Le => "<=",
            FilterOp::Gt => ">",
            FilterOp::Ge => ">=",
            FilterOp::In => "in",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    #[serde(default)]
    pub direction: Direction,
}

/// Filters and ordering shaping a query.
///
/// Identity-sensitive filters (such as an owner id) belong here so that they
/// become part of the cache key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryConstraints {
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub order_by: Vec<OrderBy>,
}

impl QueryConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_op(field, FilterOp::Eq, value)
    }

    pub fn where_op(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Canonical text form used inside cache keys.
    ///
    /// Equal constraints always render identically. Field names are quoted so
    /// separators inside them cannot collide with the surrounding format.
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        for filter in &self.filters {
            let _ = write!(out, "{:?}{}{};", filter.field, filter.op.symbol(), filter.value);
        }
        out.push('#');
        for order in &self.order_by {
            let dir = match order.direction {
                Direction::Asc => "asc",
                Direction::Desc => "desc",
            };
            let _ = write!(out, "{:?}:{};", order.field, dir);
        }
        out
    }
}

// == Mutations ==
/// Location of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocRef {
    pub collection: String,
    pub id: String,
}

impl DocRef {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for DocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A single mutation staged into a store transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BatchOperation {
    /// Create or replace the whole document
    Set { target: DocRef, payload: Fields },
    /// Merge fields into an existing document
    Update { target: DocRef, payload: Fields },
    Delete { target: DocRef },
}

impl BatchOperation {
    pub fn target(&self) -> &DocRef {
        match self {
            BatchOperation::Set { target, .. }
            | BatchOperation::Update { target, .. }
            | BatchOperation::Delete { target } => target,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BatchOperation::Set { .. } => "set",
            BatchOperation::Update { .. } => "update",
            BatchOperation::Delete { .. } => "delete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Lesson {
        id: String,
        title: String,
        order: u32,
    }

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => Fields::new(),
        }
    }

    #[test]
    fn test_document_serializes_flat() {
        let doc = Document::new("l1", fields(json!({"title": "Intro"})));
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json, json!({"id": "l1", "title": "Intro"}));

        let back: Document = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_document_decode() {
        let doc = Document::new("l1", fields(json!({"title": "Intro", "order": 1})));
        let lesson: Lesson = doc.decode().unwrap();
        assert_eq!(
            lesson,
            Lesson {
                id: "l1".into(),
                title: "Intro".into(),
                order: 1
            }
        );
    }

    #[test]
    fn test_document_decode_type_mismatch() {
        let doc = Document::new("l1", fields(json!({"title": 5})));
        assert!(doc.decode::<Lesson>().is_err());
    }

    #[test]
    fn test_canonical_is_deterministic() {
        let a = QueryConstraints::new()
            .where_eq("userId", "u1")
            .where_op("score", FilterOp::Ge, 10)
            .order_by("score", Direction::Desc);
        let b = QueryConstraints::new()
            .where_eq("userId", "u1")
            .where_op("score", FilterOp::Ge, 10)
            .order_by("score", Direction::Desc);

        assert_eq!(a.canonical(), b.canonical());
        assert_ne!(a.canonical(), QueryConstraints::new().canonical());
    }

    #[test]
    fn test_canonical_distinguishes_values() {
        let a = QueryConstraints::new().where_eq("userId", "u1");
        let b = QueryConstraints::new().where_eq("userId", "u2");
        let c = QueryConstraints::new().where_eq("userId", 1);
        assert_ne!(a.canonical(), b.canonical());
        assert_ne!(a.canonical(), c.canonical());
    }

    #[test]
    fn test_batch_operation_wire_format() {
        let op: BatchOperation = serde_json::from_value(json!({
            "op": "update",
            "target": {"collection": "users", "id": "u1"},
            "payload": {"plan": "pro"}
        }))
        .unwrap();

        assert_eq!(op.kind(), "update");
        assert_eq!(op.target(), &DocRef::new("users", "u1"));
        assert_eq!(op.target().to_string(), "users/u1");
    }

    #[test]
    fn test_cursor_is_transparent() {
        let cursor = Cursor::new("abc");
        assert_eq!(serde_json::to_value(&cursor).unwrap(), json!("abc"));
    }
}
