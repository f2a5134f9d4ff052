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
    state
        .obs
        .monitor("/")
        .call(async {
            let info = lib_info();
            state.obs.logger.info(
                "Hello from Project 1",
                Fields::new()
                    .with("request", "root")
                    .with("lib_version", &info.version),
            );

            Ok(Json(ApiResponse::ok(
                json!({
                    "service": "Project 1",
                    "message": "Hello from Project 1!",
                    "shared_lib_version": info.version,
                    "service_version": env!("CARGO_PKG_VERSION"),
                    "correlation_id": ctx.correlation_id(),
                }),
                "Project 1 API is running",
            )))
        })
        .await
}
