mod common;

use axum::http::StatusCode;
use common::{body_json, TestApp};
use hub_core::observability::CORRELATION_ID_HEADER;

#[tokio::test]
async fn status_lists_endpoints() {
    let app = TestApp::spawn();

    let response = app.get("/status").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["message"], "All systems operational");
    assert_eq!(body["data"]["operational"], true);
    let endpoints: Vec<&str> = body["data"]["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e.as_str().unwrap())
        .collect();
    assert!(endpoints.contains(&"/status"));
    assert!(endpoints.contains(&"/health"));
}

#[tokio::test]
async fn status_log_carries_correlation_id() {
    let app = TestApp::spawn();

    app.get_with_headers("/status", &[(CORRELATION_ID_HEADER, "status-1")])
        .await;

    let record = app
        .log_sink
        .records()
        .into_iter()
        .find(|r| r["message"] == "Status check requested")
        .expect("status record");
    assert_eq!(record["correlation_id"], "status-1");
    assert_eq!(record["service"], "project_3");
}

#[tokio::test]
async fn health_and_root() {
    let app = TestApp::spawn();

    let body = body_json(app.get("/health").await).await;
    assert_eq!(body["data"]["service"], "project_3");

    let body = body_json(app.get("/").await).await;
    assert_eq!(body["data"]["service"], "Project 3");
    assert_eq!(body["message"], "Project 3 API is running");

    // One health gauge plus request count and duration for the root call.
    assert_eq!(app.metrics.flush().await, 3);
    assert_eq!(app.metrics_sink.batches().len(), 1);
}
