//! Request and Response models for the inspection API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{BatchRequest, PageRequest, QueryRequest};
pub use responses::{
    BatchResponse, ClearResponse, ErrorResponse, HealthResponse, NetworkResponse, QueryResult,
    StatsResponse,
};
