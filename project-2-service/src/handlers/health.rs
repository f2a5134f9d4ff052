use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use hub_core::observability::metrics::render_prometheus;
use hub_core::observability::{Fields, RequestContext};
use hub_core::response::{self, ApiResponse, LibInfo};
use serde_json::{json, Value};

pub async fn health_check(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Json<ApiResponse<Value>> {
    let gpu = &state.config.gpu;
    // Reports configuration only; no device probe is made.
    let gpu_available = gpu.enabled;

    state.obs.metrics.record_health_check(
        true,
        Fields::new()
            .with("gpu_available", &gpu_available)
            .with("gpu_type", &gpu.gpu_type),
    );

    Json(ApiResponse::ok(
        json!({
            "status": "healthy",
            "service": state.config.service_name(),
            "gpu_available": gpu_available,
            "gpu_type": gpu.gpu_type,
            "correlation_id": ctx.correlation_id(),
        }),
        "Service is operational",
    ))
}

pub async fn version(State(state): State<AppState>, ctx: RequestContext) -> Json<ApiResponse<Value>> {
    Json(ApiResponse::ok(
        json!({
            "service_version": env!("CARGO_PKG_VERSION"),
            "shared_lib_info": response::lib_info(),
            "gpu_acceleration": state.config.gpu.enabled,
            "gpu_type": state.config.gpu.gpu_type,
            "correlation_id": ctx.correlation_id(),
        }),
        "",
    ))
}

pub async fn lib_info() -> Json<ApiResponse<LibInfo>> {
    Json(ApiResponse::ok(response::lib_info(), "Shared library information"))
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        render_prometheus(),
    )
}
