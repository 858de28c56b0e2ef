//! Docstore Cache - A cache-aware data-access layer over a document store
//!
//! Bounded FIFO+TTL caching for document reads, capped queries, cursor
//! pagination and ceiling-split batch writes.

pub mod access;
pub mod api;
pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod network;
pub mod store;

pub use access::{DataAccess, PaginatedResult, PreloadSummary};
pub use api::AppState;
pub use batch::{BatchWriter, CommitReport};
pub use config::Config;
pub use error::{DataError, StoreError};
pub use network::NetworkModeSwitch;
pub use store::{DocumentStore, MemoryStore};
