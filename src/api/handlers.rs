//! API Handlers
//!
//! HTTP request handlers for each inspection endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::access::{DataAccess, PaginatedResult, PreloadSummary};
use crate::config::Config;
use crate::error::{DataError, Result};
use crate::models::{
    BatchRequest, BatchResponse, ClearResponse, ErrorResponse, HealthResponse, NetworkResponse,
    PageRequest, QueryRequest, QueryResult, StatsResponse,
};
use crate::store::{DocRef, Document, MemoryStore};

/// Application state shared across all handlers.
///
/// Cloning shares the store and the cache.
#[derive(Clone)]
pub struct AppState {
    pub access: DataAccess<MemoryStore>,
}

impl AppState {
    pub fn new(access: DataAccess<MemoryStore>) -> Self {
        Self { access }
    }

    /// Creates a new AppState over an empty in-memory store.
    pub fn from_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new().with_max_ops(config.server_max_ops));
        Self::new(DataAccess::from_config(store, config))
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        self.access.store()
    }
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.access.cache_stats().await.into())
}

/// Handler for DELETE /cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let cleared = state.access.clear_cache().await;
    Json(ClearResponse { cleared })
}

/// Handler for GET /docs/:collection/:id
///
/// Reads through the cache; a missing document is a 404.
pub async fn get_document_handler(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Response> {
    let doc: Option<Document> = state.access.get_by_id(&collection, &id).await?;

    Ok(match doc {
        Some(doc) => Json(doc).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!(
                "Document '{}/{}' not found",
                collection, id
            ))),
        )
            .into_response(),
    })
}

/// Handler for POST /query
pub async fn query_handler(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResult>> {
    if let Some(error_msg) = req.validate() {
        return Err(DataError::InvalidRequest(error_msg));
    }

    let items: Vec<Document> = state
        .access
        .run_query(
            &req.collection,
            &req.constraints,
            req.limit(),
            req.cache.unwrap_or(true),
        )
        .await?;

    Ok(Json(QueryResult::new(items)))
}

/// Handler for POST /page
pub async fn page_handler(
    State(state): State<AppState>,
    Json(req): Json<PageRequest>,
) -> Result<Json<PaginatedResult<Document>>> {
    if let Some(error_msg) = req.validate() {
        return Err(DataError::InvalidRequest(error_msg));
    }

    let page = state
        .access
        .fetch_page(
            &req.collection,
            &req.constraints,
            req.cursor.as_ref(),
            req.page_size(),
        )
        .await?;

    Ok(Json(page))
}

/// Handler for POST /batch
///
/// Commits the operations through a fresh batch writer, one report per
/// store transaction, then drops the cached reads of every written document.
/// A failed batch may have committed its earlier transactions, so the cache
/// is invalidated either way.
pub async fn batch_handler(
    State(state): State<AppState>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<BatchResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(DataError::InvalidRequest(error_msg));
    }

    let targets: Vec<DocRef> = req.operations.iter().map(|op| op.target().clone()).collect();
    let mut writer = state.access.batch_writer();
    let result = writer.stage_all(req.operations).await;
    state.access.invalidate_documents(&targets).await;

    Ok(Json(BatchResponse::new(result?)))
}

/// Handler for PUT /network/offline
pub async fn network_offline_handler(
    State(state): State<AppState>,
) -> Result<Json<NetworkResponse>> {
    state.access.network().enable_offline().await?;
    Ok(Json(NetworkResponse { online: false }))
}

/// Handler for PUT /network/online
pub async fn network_online_handler(
    State(state): State<AppState>,
) -> Result<Json<NetworkResponse>> {
    state.access.network().enable_online().await?;
    Ok(Json(NetworkResponse { online: true }))
}

/// Handler for POST /preload/:identity
///
/// Warms the shared partition the other routes read from. The owned pages
/// are filtered on the identity, so their keys are per identity already.
pub async fn preload_handler(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<PreloadSummary>> {
    if identity.is_empty() {
        return Err(DataError::InvalidRequest("Identity cannot be empty".to_string()));
    }

    let summary = state.access.preload(&identity).await?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BatchOperation, DocRef, QueryConstraints};
    use serde_json::json;

    fn test_state() -> AppState {
        AppState::from_config(Config::default())
    }

    fn query_request(collection: &str) -> QueryRequest {
        QueryRequest {
            collection: collection.to_string(),
            constraints: QueryConstraints::default(),
            max_results: None,
            cache: None,
        }
    }

    #[tokio::test]
    async fn test_get_document_hit_and_miss() {
        let state = test_state();
        state.store().insert("users", "u1", json!({"name": "Ada"}));

        let found = get_document_handler(
            State(state.clone()),
            Path(("users".to_string(), "u1".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(found.status(), StatusCode::OK);

        let missing = get_document_handler(
            State(state),
            Path(("users".to_string(), "nobody".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_query_handler_caches_by_default() {
        let state = test_state();
        state.store().insert("lessons", "l1", json!({"title": "Intro"}));

        let first = query_handler(State(state.clone()), Json(query_request("lessons")))
            .await
            .unwrap();
        assert_eq!(first.count, 1);

        query_handler(State(state.clone()), Json(query_request("lessons")))
            .await
            .unwrap();
        assert_eq!(state.store().query_calls(), 1);
    }

    #[tokio::test]
    async fn test_query_handler_rejects_empty_collection() {
        let state = test_state();
        let result = query_handler(State(state), Json(query_request(""))).await;
        assert!(matches!(result, Err(DataError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_batch_handler() {
        let state = test_state();
        let req = BatchRequest {
            operations: vec![
                BatchOperation::Set {
                    target: DocRef::new("users", "u1"),
                    payload: json!({"name": "Ada"}).as_object().cloned().unwrap(),
                },
                BatchOperation::Delete {
                    target: DocRef::new("users", "u2"),
                },
            ],
        };

        let response = batch_handler(State(state.clone()), Json(req)).await.unwrap();
        assert_eq!(response.operations, 2);
        assert_eq!(response.commits.len(), 1);
        assert_eq!(state.store().count("users"), 1);
    }

    fn doc_path(collection: &str, id: &str) -> Path<(String, String)> {
        Path((collection.to_string(), id.to_string()))
    }

    fn rename(id: &str, name: &str) -> BatchRequest {
        BatchRequest {
            operations: vec![BatchOperation::Set {
                target: DocRef::new("users", id),
                payload: json!({ "name": name }).as_object().cloned().unwrap(),
            }],
        }
    }

    #[tokio::test]
    async fn test_batch_handler_invalidates_written_documents() {
        let state = test_state();
        state.store().insert("users", "u1", json!({"name": "Ada"}));
        get_document_handler(State(state.clone()), doc_path("users", "u1"))
            .await
            .unwrap();

        batch_handler(State(state.clone()), Json(rename("u1", "Grace")))
            .await
            .unwrap();

        let doc: Option<Document> = state.access.get_by_id("users", "u1").await.unwrap();
        assert_eq!(doc.unwrap().field("name"), Some(&json!("Grace")));
        assert_eq!(state.store().get_calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_batch_still_invalidates() {
        let state = test_state();
        state.store().insert("users", "u1", json!({"name": "Ada"}));
        get_document_handler(State(state.clone()), doc_path("users", "u1"))
            .await
            .unwrap();
        state.store().fail_next_commits(1);

        let result = batch_handler(State(state.clone()), Json(rename("u1", "Grace"))).await;
        assert!(result.is_err());
        assert_eq!(state.access.cache_stats().await.entry_count, 0);
    }

    #[tokio::test]
    async fn test_network_handlers() {
        let state = test_state();

        let off = network_offline_handler(State(state.clone())).await.unwrap();
        assert!(!off.online);
        assert!(!state.store().is_online());

        let on = network_online_handler(State(state.clone())).await.unwrap();
        assert!(on.online);
        assert!(state.store().is_online());
    }

    #[tokio::test]
    async fn test_stats_and_clear_handlers() {
        let state = test_state();
        state.store().insert("users", "u1", json!({"name": "Ada"}));
        get_document_handler(
            State(state.clone()),
            Path(("users".to_string(), "u1".to_string())),
        )
        .await
        .unwrap();

        let stats = stats_handler(State(state.clone())).await;
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.misses, 1);

        let cleared = clear_cache_handler(State(state.clone())).await;
        assert_eq!(cleared.cleared, 1);
        assert_eq!(stats_handler(State(state)).await.entry_count, 0);
    }

    #[tokio::test]
    async fn test_preload_handler() {
        let state = test_state();
        state.store().insert("users", "u1", json!({"name": "Ada"}));
        state
            .store()
            .insert("progress", "p1", json!({"userId": "u1", "lesson": 3}));

        let summary = preload_handler(State(state.clone()), Path("u1".to_string()))
            .await
            .unwrap();
        assert!(summary.profile_found);
        assert_eq!(summary.pages_loaded, 1);
        assert_eq!(summary.items_loaded, 1);

        // The warmed profile serves the plain document route
        let found = get_document_handler(State(state.clone()), doc_path("users", "u1"))
            .await
            .unwrap();
        assert_eq!(found.status(), StatusCode::OK);
        assert_eq!(state.store().get_calls(), 1);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
