//! Response DTOs for the inspection API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::batch::CommitReport;
use crate::cache::CacheStats;
use crate::store::Document;

/// Response body for POST /query
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub count: usize,
    pub items: Vec<Document>,
}

impl QueryResult {
    pub fn new(items: Vec<Document>) -> Self {
        Self {
            count: items.len(),
            items,
        }
    }
}

/// Response body for POST /batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse {
    /// Operations committed across all transactions
    pub operations: usize,
    /// One entry per store transaction, in commit order
    pub commits: Vec<CommitReport>,
}

impl BatchResponse {
    pub fn new(commits: Vec<CommitReport>) -> Self {
        Self {
            operations: commits.iter().map(|c| c.operations).sum(),
            commits,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub entry_count: usize,
    pub total_bytes: usize,
    pub max_bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub skipped: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            entry_count: stats.entry_count,
            total_bytes: stats.total_bytes,
            max_bytes: stats.max_bytes,
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            skipped: stats.skipped,
        }
    }
}

/// Response body for DELETE /cache
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub cleared: usize,
}

/// Response body for the network endpoints
#[derive(Debug, Clone, Serialize)]
pub struct NetworkResponse {
    pub online: bool,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
