//! Authentication on protected routes

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_case::test_case;

use crate::common::TestApp;

#[test_case("/api/v1/users/me" ; "profile")]
#[test_case("/api/v1/users/me/location" ; "location")]
#[test_case("/api/v1/users/me/moyenne" ; "moyenne")]
#[test_case("/api/v1/plan" ; "plan")]
#[tokio::test]
async fn test_missing_token_is_unauthorized(path: &str) {
    let app = TestApp::new();

    let response = app.server.get(path).await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json::<Value>()["message"],
        "Token d'authentification manquant"
    );
}

#[tokio::test]
async fn test_garbage_token_is_invalid() {
    let app = TestApp::new();

    let response = app
        .server
        .get("/api/v1/users/me")
        .authorization_bearer("not.a.jwt")
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["message"], "Token invalide");
}

#[tokio::test]
async fn test_expired_token_is_reported() {
    let app = TestApp::new();
    let token = app.expired_access_token(7);

    let response = app
        .server
        .get("/api/v1/plan")
        .authorization_bearer(token)
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["message"], "Token expiré");
}

#[tokio::test]
async fn test_token_signed_with_another_secret_is_invalid() {
    let app = TestApp::new();
    let mut jwt = app.settings.jwt.clone();
    jwt.secret = "some-other-secret-that-is-long-enough-too".into();
    let token = orientation_server::application::services::auth_service::generate_tokens(7, &jwt)
        .unwrap()
        .access_token;

    let response = app
        .server
        .get("/api/v1/users/me")
        .authorization_bearer(token)
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_out_of_range_moyenne_is_rejected_before_storage() {
    let app = TestApp::new();
    let token = app.access_token(7);

    let response = app
        .server
        .put("/api/v1/users/me/moyenne")
        .authorization_bearer(token)
        .json(&json!({ "moyenne_generale": 21.5 }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(body["errors"][0]["field"], "moyenne_generale");
}

#[test_case("/api/v1/users/me/moyenne", json!({}) ; "empty moyenne")]
#[test_case("/api/v1/users/me/moyenne", json!({ "moyenne_math": 15.0 }) ; "moyenne without overall average")]
#[test_case("/api/v1/users/me/location", json!({}) ; "empty location")]
#[test_case("/api/v1/users/me/location", json!({ "adresse": "12 rue des Écoles", "latitude": 48.85, "longitude": 2.35 }) ; "location without etablissement")]
#[tokio::test]
async fn test_replacement_body_missing_required_fields_is_rejected(path: &str, body: Value) {
    let app = TestApp::new();
    let token = app.access_token(7);

    let response = app
        .server
        .put(path)
        .authorization_bearer(token)
        .json(&body)
        .await;

    // Rejected at extraction, before the database is reached
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], 10002);
}

#[tokio::test]
async fn test_short_new_password_is_rejected() {
    let app = TestApp::new();
    let token = app.access_token(7);

    let response = app
        .server
        .put("/api/v1/users/me/password")
        .authorization_bearer(token)
        .json(&json!({ "current_password": "Ancien123!", "new_password": "abc" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_valid_token_reaches_handler() {
    let app = TestApp::new();
    let token = app.access_token(7);

    // Past authentication the unreachable database surfaces as a server error
    let response = app
        .server
        .get("/api/v1/users/me")
        .authorization_bearer(token)
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>()["message"],
        "Erreur interne du serveur"
    );
}
