//! Request DTOs for the inspection API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::store::{BatchOperation, Cursor, QueryConstraints};

/// Request body for POST /query
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub collection: String,
    #[serde(default)]
    pub constraints: QueryConstraints,
    /// Negative values clamp like zero
    #[serde(default)]
    pub max_results: Option<i64>,
    /// Defaults to true
    #[serde(default)]
    pub cache: Option<bool>,
}

impl QueryRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_collection(&self.collection)
    }

    pub fn limit(&self) -> Option<usize> {
        self.max_results.map(non_negative)
    }
}

/// Request body for POST /page
#[derive(Debug, Clone, Deserialize)]
pub struct PageRequest {
    pub collection: String,
    #[serde(default)]
    pub constraints: QueryConstraints,
    /// Cursor returned by the previous page
    #[serde(default)]
    pub cursor: Option<Cursor>,
    #[serde(default)]
    pub page_size: Option<i64>,
}

impl PageRequest {
    pub fn validate(&self) -> Option<String> {
        validate_collection(&self.collection)
    }

    pub fn page_size(&self) -> Option<usize> {
        self.page_size.map(non_negative)
    }
}

/// Request body for POST /batch
#[derive(Debug, Clone, Deserialize)]
pub struct BatchRequest {
    pub operations: Vec<BatchOperation>,
}

impl BatchRequest {
    pub fn validate(&self) -> Option<String> {
        if self.operations.is_empty() {
            return Some("Batch must contain at least one operation".to_string());
        }
        self.operations.iter().find_map(|op| {
            let target = op.target();
            if target.collection.is_empty() || target.id.is_empty() {
                Some(format!("Invalid target '{}' in {} operation", target, op.kind()))
            } else {
                None
            }
        })
    }
}

fn validate_collection(collection: &str) -> Option<String> {
    if collection.is_empty() {
        Some("Collection cannot be empty".to_string())
    } else {
        None
    }
}

fn non_negative(value: i64) -> usize {
    value.max(0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_defaults() {
        let req: QueryRequest = serde_json::from_str(r#"{"collection": "lessons"}"#).unwrap();
        assert_eq!(req.collection, "lessons");
        assert_eq!(req.constraints, QueryConstraints::default());
        assert_eq!(req.limit(), None);
        assert!(req.cache.is_none());
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_page_request_negative_size() {
        let req: PageRequest =
            serde_json::from_str(r#"{"collection": "posts", "page_size": -5}"#).unwrap();
        assert_eq!(req.page_size(), Some(0));
    }

    #[test]
    fn test_page_request_with_constraints_and_cursor() {
        let json = r#"{
            "collection": "posts",
            "constraints": {
                "filters": [{"field": "userId", "op": "eq", "value": "u1"}],
                "order_by": [{"field": "rank", "direction": "desc"}]
            },
            "cursor": "[3,\"p003\"]",
            "page_size": 10
        }"#;
        let req: PageRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.constraints.filters.len(), 1);
        assert_eq!(req.cursor.as_ref().map(Cursor::as_str), Some("[3,\"p003\"]"));
        assert_eq!(req.page_size(), Some(10));
    }

    #[test]
    fn test_validate_empty_collection() {
        let req: QueryRequest = serde_json::from_str(r#"{"collection": ""}"#).unwrap();
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_batch_request_validation() {
        let empty: BatchRequest = serde_json::from_str(r#"{"operations": []}"#).unwrap();
        assert!(empty.validate().is_some());

        let bad_target: BatchRequest = serde_json::from_str(
            r#"{"operations": [{"op": "delete", "target": {"collection": "users", "id": ""}}]}"#,
        )
        .unwrap();
        assert!(bad_target.validate().is_some());

        let valid: BatchRequest = serde_json::from_str(
            r#"{"operations": [{"op": "delete", "target": {"collection": "users", "id": "u1"}}]}"#,
        )
        .unwrap();
        assert!(valid.validate().is_none());
    }
}
