#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use http_body_util::BodyExt;
use hub_core::observability::metrics::{InMemoryMetricsSink, MetricsClient};
use hub_core::observability::{MemorySink, Observability, StructuredLogger};
use project_3_service::config::{Project3Config, SERVICE_NAME};
use project_3_service::startup::{build_router, AppState};
use std::sync::Arc;
use tower::util::ServiceExt;

pub const TEST_PROJECT_ID: &str = "test-project";

pub struct TestApp {
    pub router: Router,
    pub log_sink: Arc<MemorySink>,
    pub metrics_sink: Arc<InMemoryMetricsSink>,
    pub metrics: Arc<MetricsClient>,
}

impl TestApp {
    pub fn spawn() -> Self {
        let log_sink = Arc::new(MemorySink::new());
        let metrics_sink = Arc::new(InMemoryMetricsSink::new());

        let logger = StructuredLogger::with_sink(
            SERVICE_NAME,
            Some(TEST_PROJECT_ID.to_string()),
            log_sink.clone(),
        );
        let metrics = Arc::new(MetricsClient::new(logger.clone(), metrics_sink.clone()));

        let state = AppState {
            config: Project3Config::default(),
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
        self.get_with_headers(uri, &[]).await
    }

    pub async fn get_with_headers(&self, uri: &str, headers: &[(&str, &str)]) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
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
