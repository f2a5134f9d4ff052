mod common;

use axum::http::StatusCode;
use common::{body_json, TestApp};
use hub_core::observability::metrics::{ERROR_COUNT, REQUEST_COUNT};
use serde_json::json;

#[tokio::test]
async fn index_counts_documents() {
    let app = TestApp::spawn();

    let response = app
        .post_json(
            "/index",
            json!({"documents": ["a", "b", "c"], "metadata": {"source": "test"}}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["indexed_count"], 3);
    assert_eq!(body["data"]["status"], "success");
    assert_eq!(body["message"], "Successfully indexed 3 documents");

    let points = app.metrics.snapshot();
    assert_eq!(points[0].short_name(), REQUEST_COUNT);
    assert_eq!(points[0].label("endpoint"), Some("/index"));
    assert_eq!(points[0].label("method"), Some("POST"));
}

#[tokio::test]
async fn query_returns_top_k_ranked_results() {
    let app = TestApp::spawn();

    let response = app
        .post_json("/query", json!({"query": "what is a gpu", "top_k": 3}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let results = body["data"]["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["document"], "Sample document 0");
    assert!((results[1]["score"].as_f64().unwrap() - 0.85).abs() < 1e-9);
    assert_eq!(body["data"]["gpu_accelerated"], true);
    assert_eq!(body["data"]["query"], "what is a gpu");
}

#[tokio::test]
async fn query_uses_default_top_k() {
    let app = TestApp::spawn();

    let body = body_json(app.post_json("/query", json!({"query": "hello"})).await).await;
    assert_eq!(body["data"]["results"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn invalid_query_is_rejected_and_counted_as_error() {
    let app = TestApp::spawn();

    let response = app
        .post_json("/query", json!({"query": "", "top_k": 100}))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);

    let points = app.metrics.snapshot();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].short_name(), ERROR_COUNT);
    assert_eq!(points[0].label("error_type"), Some("AppError"));

    let records = app.log_sink.records();
    assert!(records.iter().any(|r| r["severity"] == "ERROR"));
}

#[tokio::test]
async fn empty_index_request_is_rejected() {
    let app = TestApp::spawn();

    let response = app.post_json("/index", json!({"documents": []})).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
