//! API Module
//!
//! HTTP handlers and routing for the inspection API over the data-access
//! layer.
//!
//! # Endpoints
//! - `GET /health`, `GET /stats`, `DELETE /cache`
//! - `GET /docs/:collection/:id`
//! - `POST /query`, `POST /page`, `POST /batch`
//! - `PUT /network/offline`, `PUT /network/online`
//! - `POST /preload/:identity`

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
