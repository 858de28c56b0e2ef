//! Cache key derivation.

use std::fmt;

use crate::store::{Cursor, QueryConstraints};

// == Cache Key ==
/// Opaque cache key.
///
/// Keys are derived from everything that shapes a result: kind of lookup,
/// optional identity namespace, collection, constraints, cursor and size.
/// Equal logical lookups always produce equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for a single-document lookup.
    pub fn document(namespace: Option<&str>, collection: &str, id: &str) -> Self {
        Self(format!("doc|{:?}|{:?}|{:?}", namespace, collection, id))
    }

    /// Key for a bounded query.
    pub fn query(
        namespace: Option<&str>,
        collection: &str,
        constraints: &QueryConstraints,
        limit: usize,
    ) -> Self {
        Self(format!(
            "query|{:?}|{:?}|{}|{}",
            namespace,
            collection,
            constraints.canonical(),
            limit
        ))
    }

    /// Key for one page of a paginated query.
    pub fn page(
        namespace: Option<&str>,
        collection: &str,
        constraints: &QueryConstraints,
        cursor: Option<&Cursor>,
        page_size: usize,
    ) -> Self {
        Self(format!(
            "page|{:?}|{:?}|{}|{:?}|{}",
            namespace,
            collection,
            constraints.canonical(),
            cursor.map(Cursor::as_str),
            page_size
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}
