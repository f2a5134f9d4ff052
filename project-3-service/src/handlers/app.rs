use crate::startup::{AppState, ENDPOINTS};
use axum::{extract::State, Json};
use hub_core::error::AppError;
use hub_core::observability::{Fields, RequestContext};
use hub_core::response::{lib_info, ApiResponse};
use serde_json::{json, Value};

pub async fn root(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    state
        .obs
        .monitor("/")
        .call(async {
            let info = lib_info();
            state.obs.logger.info(
                "Hello from Project 3",
                Fields::new()
                    .with("request", "root")
                    .with("lib_version", &info.version),
            );

            Ok::<_, AppError>(Json(ApiResponse::ok(
                json!({
                    "service": "Project 3",
                    "message": "Hello from Project 3!",
                    "shared_lib_version": info.version,
                    "service_version": env!("CARGO_PKG_VERSION"),
                    "correlation_id": ctx.correlation_id(),
                }),
                "Project 3 API is running",
            )))
        })
        .await
}

/// Extended status: operational flag plus the list of served endpoints.
pub async fn status(State(state): State<AppState>) -> Result<Json<ApiResponse<Value>>, AppError> {
    state
        .obs
        .monitor("/status")
        .call(async {
            let info = lib_info();
            state.obs.logger.info(
                "Status check requested",
                Fields::new().with("lib_version", &info.version),
            );

            Ok::<_, AppError>(Json(ApiResponse::ok(
                json!({
                    "service": "Project 3",
                    "operational": true,
                    "shared_lib_version": info.version,
                    "endpoints": ENDPOINTS,
                }),
                "All systems operational",
            )))
        })
        .await
}
