use crate::config::Project1Config;
use crate::handlers;
use axum::{middleware::from_fn_with_state, routing::get, Router};
use hub_core::config::MetricsSinkKind;
use hub_core::error::AppError;
use hub_core::lifecycle::shutdown_signal;
use hub_core::middleware::correlation_middleware;
use hub_core::observability::Observability;
use std::future::IntoFuture;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Project1Config,
    pub obs: Observability,
}

pub fn build_router(state: AppState) -> Router {
    let logger = state.obs.logger.clone();

    let mut router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/version", get(handlers::version))
        .route("/lib-info", get(handlers::lib_info));

    if state.config.common.observability.metrics.sink == MetricsSinkKind::Prometheus {
        router = router.route("/metrics", get(handlers::metrics_endpoint));
    }

    router
        .with_state(state)
        // Panics become 500s inside the correlation scope so they still get the header.
        .layer(CatchPanicLayer::new())
        .layer(from_fn_with_state(logger, correlation_middleware))
        .layer(TraceLayer::new_for_http())
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: Project1Config, obs: Observability) -> Result<Self, AppError> {
        let state = AppState {
            config: config.clone(),
            obs,
        };

        let app = build_router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn observability(&self) -> &Observability {
        &self.state.obs
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
