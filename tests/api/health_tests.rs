//! Health, welcome and metrics endpoints

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::TestApp;

#[tokio::test]
async fn test_root_returns_welcome_message() {
    let app = TestApp::new();

    let response = app.server.get("/").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.json::<Value>(),
        json!({ "message": "Welcome to the Student Management API" })
    );
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let response = app.server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_liveness() {
    let app = TestApp::new();

    let response = app.server.get("/health/live").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!({ "status": "alive" }));
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let app = TestApp::new();

    let response = app.server.get("/health/ready").await;

    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["checks"]["database"]["status"], "unhealthy");
    // No Redis configured, so no Redis check
    assert!(body["checks"].get("redis").is_none());
}

#[tokio::test]
async fn test_metrics_exposes_request_counters() {
    let app = TestApp::new();

    app.server.get("/health").await;
    let response = app.server.get("/metrics").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let text = response.text();
    assert!(text.contains("orientation_api_http_requests_total"));
    assert!(text.contains("path=\"/health\""));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new();

    let response = app.server.get("/api/v1/nope").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
