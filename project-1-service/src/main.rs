use hub_core::lifecycle::spawn_periodic_flush;
use hub_core::observability::{init_tracing, Fields, Observability};
use hub_core::response::lib_info;
use project_1_service::config::Project1Config;
use project_1_service::startup::Application;
use std::time::Duration;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = Project1Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    let observability = &config.common.observability;
    init_tracing(
        config.service_name(),
        &observability.log_level,
        observability.otlp_endpoint.as_deref(),
    );

    let obs = Observability::from_config(config.service_name(), observability).map_err(|e| {
        tracing::error!("Failed to initialize observability: {}", e);
        std::io::Error::other(format!("Observability error: {}", e))
    })?;

    obs.logger.info(
        "Project 1 API starting up",
        Fields::new()
            .with("lib_version", &lib_info().version)
            .with("project_id", &observability.project_id),
    );

    let flusher = spawn_periodic_flush(
        obs.metrics.clone(),
        Duration::from_secs(observability.metrics.flush_interval_secs),
    );

    let app = Application::build(config.clone(), obs.clone())
        .await
        .map_err(|e| std::io::Error::other(format!("Startup error: {}", e)))?;
    let result = app.run_until_stopped().await;

    if let Some(flusher) = flusher {
        flusher.abort();
    }
    let flushed = obs.metrics.flush().await;
    obs.logger
        .info("Project 1 API stopped", Fields::new().with("flushed_points", &flushed));

    result
}
