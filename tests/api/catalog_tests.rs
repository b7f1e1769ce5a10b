//! Catalog query string handling

use axum::http::StatusCode;

use crate::common::TestApp;

#[tokio::test]
async fn test_non_numeric_limit_is_bad_request() {
    let app = TestApp::new();

    let response = app.server.get("/api/v1/formations?limit=beaucoup").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_numeric_formation_id_is_bad_request() {
    let app = TestApp::new();

    let response = app.server.get("/api/v1/formations/abc").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_catalog_is_public() {
    let app = TestApp::new();

    // No token: the request reaches the handler and fails on the database
    let response = app.server.get("/api/v1/academies").await;

    assert_ne!(response.status_code(), StatusCode::UNAUTHORIZED);
}
