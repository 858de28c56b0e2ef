//! API Routes
//!
//! Configures the Axum router with all inspection endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    batch_handler, clear_cache_handler, get_document_handler, health_handler,
    network_offline_handler, network_online_handler, page_handler, preload_handler,
    query_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /stats` - Cache statistics
/// - `DELETE /cache` - Drop every cached entry
/// - `GET /docs/:collection/:id` - Cached single-document read
/// - `POST /query` - Bounded, optionally cached query
/// - `POST /page` - One page of an ordered query
/// - `POST /batch` - Commit operations in ceiling-sized transactions
/// - `PUT /network/offline`, `PUT /network/online` - Toggle store network mode
/// - `POST /preload/:identity` - Warm an identity's cache partition
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/cache", delete(clear_cache_handler))
        .route("/docs/:collection/:id", get(get_document_handler))
        .route("/query", post(query_handler))
        .route("/page", post(page_handler))
        .route("/batch", post(batch_handler))
        .route("/network/offline", put(network_offline_handler))
        .route("/network/online", put(network_online_handler))
        .route("/preload/:identity", post(preload_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
