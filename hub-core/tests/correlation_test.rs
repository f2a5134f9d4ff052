use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
    routing::get,
};
use hub_core::middleware::correlation_middleware;
use hub_core::observability::{
    CORRELATION_ID_HEADER, Fields, MemorySink, Observability, StructuredLogger,
    metrics::{InMemoryMetricsSink, MetricsClient},
};
use serde::Deserialize;
use tower::ServiceExt;

#[derive(Deserialize)]
struct Marker {
    marker: String,
}

async fn chatty(State(obs): State<Observability>, Query(q): Query<Marker>) -> &'static str {
    obs.logger.info("step one", Fields::new().with("marker", &q.marker));
    tokio::time::sleep(Duration::from_millis(10)).await;
    obs.logger.info("step two", Fields::new().with("marker", &q.marker));
    "ok"
}

async fn failing(State(obs): State<Observability>) -> Result<&'static str, StatusCode> {
    obs.monitor("/fail")
        .call(async {
            obs.logger.error("about to fail", ());
            Err::<&'static str, _>(hub_core::error::AppError::ServiceUnavailable)
        })
        .await
        .map_err(|e| e.status_code())
}

fn app() -> (Router, Arc<MemorySink>, Arc<MetricsClient>) {
    let sink = Arc::new(MemorySink::new());
    let logger = StructuredLogger::with_sink("project_1", Some("proj".to_string()), sink.clone());
    let metrics = Arc::new(MetricsClient::new(
        logger.clone(),
        Arc::new(InMemoryMetricsSink::new()),
    ));
    let obs = Observability::new(logger.clone(), metrics.clone());

    let router = Router::new()
        .route("/chatty", get(chatty))
        .route("/fail", get(failing))
        .with_state(obs)
        .layer(from_fn_with_state(logger, correlation_middleware));
    (router, sink, metrics)
}

fn request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn concurrent_requests_keep_separate_correlation_ids() {
    let (app, sink, _) = app();

    let (a, b) = tokio::join!(
        app.clone().oneshot(request("/chatty?marker=a")),
        app.clone().oneshot(request("/chatty?marker=b")),
    );
    let a = a.unwrap();
    let b = b.unwrap();
    let id_a = a.headers()[CORRELATION_ID_HEADER].to_str().unwrap().to_string();
    let id_b = b.headers()[CORRELATION_ID_HEADER].to_str().unwrap().to_string();
    assert_ne!(id_a, id_b);

    let mut by_marker: HashMap<String, HashSet<String>> = HashMap::new();
    for record in sink.records() {
        if let Some(marker) = record["marker"].as_str() {
            by_marker
                .entry(marker.to_string())
                .or_default()
                .insert(record["correlation_id"].as_str().unwrap().to_string());
        }
    }

    assert_eq!(by_marker["a"], HashSet::from([id_a]));
    assert_eq!(by_marker["b"], HashSet::from([id_b]));
}

#[tokio::test]
async fn generated_ids_are_distinct_across_requests() {
    let (app, _, _) = app();
    let mut seen = HashSet::new();

    for _ in 0..50 {
        let response = app.clone().oneshot(request("/chatty?marker=x")).await.unwrap();
        let id = response.headers()[CORRELATION_ID_HEADER]
            .to_str()
            .unwrap()
            .to_string();
        assert!(!id.is_empty());
        assert!(seen.insert(id));
    }
}

#[tokio::test]
async fn failed_request_is_traceable() {
    let (app, sink, metrics) = app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/fail")
                .header(CORRELATION_ID_HEADER, "fail-123")
                .header("x-cloud-trace-context", "105445aa7843bc8bf206b12000100000/1;o=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()[CORRELATION_ID_HEADER], "fail-123");

    let records = sink.records();
    assert!(records.len() >= 3);
    for record in &records {
        assert_eq!(record["correlation_id"], "fail-123");
        assert_eq!(
            record["logging.googleapis.com/trace"],
            "projects/proj/traces/105445aa7843bc8bf206b12000100000"
        );
    }

    let points = metrics.snapshot();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].label("error_type"), Some("AppError"));
}
