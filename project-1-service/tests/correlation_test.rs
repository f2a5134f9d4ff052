mod common;

use common::{body_json, TestApp, TEST_PROJECT_ID};
use hub_core::observability::{CLOUD_TRACE_CONTEXT_HEADER, CORRELATION_ID_HEADER};

const TRACE_HEADER: &str = "105445aa7843bc8bf206b12000100000/1;o=1";

#[tokio::test]
async fn inbound_correlation_id_is_echoed() {
    let app = TestApp::spawn();

    let response = app
        .get_with_headers("/", &[(CORRELATION_ID_HEADER, "req-abc-123")])
        .await;

    assert_eq!(response.headers()[CORRELATION_ID_HEADER], "req-abc-123");
    let body = body_json(response).await;
    assert_eq!(body["data"]["correlation_id"], "req-abc-123");
}

#[tokio::test]
async fn missing_correlation_id_is_generated_per_request() {
    let app = TestApp::spawn();

    let first = app.get("/health").await;
    let second = app.get("/health").await;

    let first = first.headers()[CORRELATION_ID_HEADER].to_str().unwrap().to_string();
    let second = second.headers()[CORRELATION_ID_HEADER].to_str().unwrap().to_string();
    assert!(!first.is_empty());
    assert_ne!(first, second);
}

#[tokio::test]
async fn every_record_of_a_request_shares_its_context() {
    let app = TestApp::spawn();

    let response = app
        .get_with_headers(
            "/",
            &[
                (CORRELATION_ID_HEADER, "corr-xyz"),
                (CLOUD_TRACE_CONTEXT_HEADER, TRACE_HEADER),
            ],
        )
        .await;
    assert_eq!(response.headers()[CLOUD_TRACE_CONTEXT_HEADER], TRACE_HEADER);

    let records = app.log_sink.records();
    let messages: Vec<_> = records
        .iter()
        .map(|r| r["message"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(messages, vec!["Incoming request: GET /", "Hello from Project 1"]);

    for record in &records {
        assert_eq!(record["service"], "project_1");
        assert_eq!(record["correlation_id"], "corr-xyz");
        assert_eq!(record["trace_id"], "105445aa7843bc8bf206b12000100000");
        assert_eq!(
            record["logging.googleapis.com/trace"],
            format!(
                "projects/{}/traces/105445aa7843bc8bf206b12000100000",
                TEST_PROJECT_ID
            )
        );
    }
}

#[tokio::test]
async fn unknown_route_still_gets_correlation_header() {
    let app = TestApp::spawn();

    let response = app
        .get_with_headers("/does-not-exist", &[(CORRELATION_ID_HEADER, "lost-1")])
        .await;

    assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    assert_eq!(response.headers()[CORRELATION_ID_HEADER], "lost-1");
}
