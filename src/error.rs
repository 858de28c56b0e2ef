//! Error types for the data-access layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Store Error Enum ==
/// Failures reported by the external document store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Store or network unavailable. Never cached, never retried here.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A transaction carried more operations than the store accepts.
    #[error("Transaction quota exceeded: {attempted} operations (limit {limit})")]
    QuotaExceeded { attempted: usize, limit: usize },

    /// The store refused a mutation (e.g. update of a missing document)
    #[error("Store rejected operation: {0}")]
    Rejected(String),
}

// == Data Error Enum ==
/// Unified error type for the data-access layer.
#[derive(Error, Debug)]
pub enum DataError {
    /// Error surfaced unchanged from the external store
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A document could not be mapped into the requested type
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// An external call did not complete in time
    #[error("Timed out after {after_ms}ms waiting for {operation}")]
    Timeout {
        operation: &'static str,
        after_ms: u64,
    },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl DataError {
    /// True when the store reported a transaction over its operation ceiling.
    pub fn is_quota_violation(&self) -> bool {
        matches!(self, DataError::Store(StoreError::QuotaExceeded { .. }))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for DataError {
    fn into_response(self) -> Response {
        let status = match &self {
            DataError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            DataError::Store(StoreError::QuotaExceeded { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            DataError::Store(StoreError::Rejected(_)) => StatusCode::CONFLICT,
            DataError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DataError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            DataError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the data-access layer.
pub type Result<T> = std::result::Result<T, DataError>;

/// Result type returned by `DocumentStore` implementations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
