//! Document indexing and retrieval endpoints.
//!
//! Retrieval is simulated: results are synthetic documents with descending
//! scores, enough to exercise the request path end to end.

use crate::startup::AppState;
use axum::{extract::State, http::Method, Json};
use hub_core::error::AppError;
use hub_core::observability::Fields;
use hub_core::response::ApiResponse;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use validator::Validate;

const SIMULATED_PROCESSING_MS: u64 = 45;

#[derive(Debug, Deserialize, Validate)]
pub struct DocumentRequest {
    #[validate(length(min = 1, message = "At least one document is required"))]
    pub documents: Vec<String>,
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct QueryRequest {
    #[validate(length(min = 1, message = "Query cannot be empty"))]
    pub query: String,
    #[serde(default = "default_top_k")]
    #[validate(range(min = 1, max = 50))]
    pub top_k: usize,
    #[serde(default = "default_use_gpu")]
    pub use_gpu: bool,
}

fn default_top_k() -> usize {
    5
}

fn default_use_gpu() -> bool {
    true
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RetrievedDocument {
    pub document: String,
    pub score: f64,
    pub metadata: Value,
}

/// Synthetic ranking: the i-th result scores `0.95 - 0.1 * i`.
pub fn simulated_results(top_k: usize) -> Vec<RetrievedDocument> {
    (0..top_k)
        .map(|i| RetrievedDocument {
            document: format!("Sample document {}", i),
            score: 0.95 - (i as f64 * 0.1),
            metadata: json!({ "source": format!("doc_{}", i) }),
        })
        .collect()
}

pub async fn index_documents(
    State(state): State<AppState>,
    Json(request): Json<DocumentRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let gpu_enabled = state.config.gpu.enabled;

    state
        .obs
        .monitor("/index")
        .method(Method::POST)
        .call(async {
            request.validate()?;

            let count = request.documents.len();
            state.obs.logger.info(
                "Indexing documents",
                Fields::new()
                    .with("doc_count", &count)
                    .with("use_gpu", &gpu_enabled)
                    .with(
                        "metadata_keys",
                        &request.metadata.as_ref().map(|m| m.len()).unwrap_or(0),
                    ),
            );

            Ok::<_, AppError>(Json(ApiResponse::ok(
                json!({
                    "indexed_count": count,
                    "status": "success",
                    "gpu_accelerated": gpu_enabled,
                }),
                format!("Successfully indexed {} documents", count),
            )))
        })
        .await
}

pub async fn query_rag(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    state
        .obs
        .monitor("/query")
        .method(Method::POST)
        .call(async {
            request.validate()?;

            let use_gpu = request.use_gpu && state.config.gpu.enabled;
            state.obs.logger.info(
                "Processing RAG query",
                Fields::new()
                    .with("query_length", &request.query.chars().count())
                    .with("top_k", &request.top_k)
                    .with("gpu_enabled", &use_gpu),
            );

            Ok::<_, AppError>(Json(ApiResponse::ok(
                json!({
                    "query": request.query,
                    "results": simulated_results(request.top_k),
                    "gpu_accelerated": use_gpu,
                    "processing_time_ms": SIMULATED_PROCESSING_MS,
                }),
                "Query processed successfully",
            )))
        })
        .await
}
