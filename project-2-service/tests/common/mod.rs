#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use hub_core::observability::metrics::{InMemoryMetricsSink, MetricsClient};
use hub_core::observability::{MemorySink, Observability, StructuredLogger};
use project_2_service::config::{Project2Config, SERVICE_NAME};
use project_2_service::startup::{build_router, AppState};
use std::sync::Arc;
use tower::util::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub log_sink: Arc<MemorySink>,
    pub metrics_sink: Arc<InMemoryMetricsSink>,
    pub metrics: Arc<MetricsClient>,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::spawn_with_config(Project2Config::default())
    }

    pub fn spawn_with_config(config: Project2Config) -> Self {
        let log_sink = Arc::new(MemorySink::new());
        let metrics_sink = Arc::new(InMemoryMetricsSink::new());

        let logger = StructuredLogger::with_sink(SERVICE_NAME, None, log_sink.clone());
        let metrics = Arc::new(MetricsClient::new(logger.clone(), metrics_sink.clone()));

        let state = AppState {
            config,
            obs: Observability::new(logger, metrics.clone()),
        };

        TestApp {
            router: build_router(state),
            log_sink,
            metrics_sink,
            metrics,
        }
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .expect("Failed to execute request")
    }
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}
