use crate::startup::AppState;
use axum::{extract::State, Json};
use hub_core::error::AppError;
use hub_core::observability::{Fields, RequestContext};
use hub_core::response::{lib_info, ApiResponse};
use serde_json::{json, Value};

pub async fn root(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let gpu = &state.config.gpu;

    state
        .obs
        .monitor("/")
        .call(async {
            let info = lib_info();
            state.obs.logger.info(
                "Hello from Project 2 RAG",
                Fields::new()
                    .with("request", "root")
                    .with("lib_version", &info.version),
            );

            Ok(Json(ApiResponse::ok(
                json!({
                    "service": "Project 2 - RAG System",
                    "message": "Hello from RAG Service!",
                    "shared_lib_version": info.version,
                    "service_version": env!("CARGO_PKG_VERSION"),
                    "gpu_enabled": gpu.enabled,
                    "gpu_type": gpu.gpu_type,
                    "correlation_id": ctx.correlation_id(),
                }),
                "RAG API is running with GPU acceleration",
            )))
        })
        .await
}
