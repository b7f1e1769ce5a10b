//! Authentication endpoint tests
//!
//! Covers the code-store paths and request validation; account creation
//! and login need the database and are tested at the service level.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_case::test_case;

use orientation_server::infrastructure::cache::{CodePurpose, CodeStore};

use crate::common::{unique_email, TestApp};

fn register_body(email: &str, password: &str) -> Value {
    json!({
        "email": email,
        "password": password,
        "nom": "Martin",
        "prenom": "Léa",
        "sexe": "F",
        "date_naissance": "2007-03-14"
    })
}

#[test_case("not-an-email", "Motdepasse123" ; "invalid email")]
#[test_case("lea@example.com", "court" ; "short password")]
#[tokio::test]
async fn test_register_rejects_invalid_body(email: &str, password: &str) {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/v1/auth/register")
        .json(&register_body(email, password))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(body["code"], 10007);
    assert!(body["errors"].is_array());
    assert!(app.codes.is_empty());
}

#[tokio::test]
async fn test_register_missing_field_is_bad_request() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/v1/auth/register")
        .json(&json!({ "email": "lea@example.com", "password": "Motdepasse123" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], 10002);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/v1/auth/login")
        .text("{\"email\": ")
        .content_type("application/json")
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_resend_without_pending_registration_is_not_found() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/v1/auth/register/resend")
        .json(&json!({ "email": unique_email() }))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_resend_issues_a_new_code() {
    let app = TestApp::new();
    let email = unique_email();
    app.seed_pending_registration(&email, "000000").await;

    let response = app
        .server
        .post("/api/v1/auth/register/resend")
        .json(&json!({ "email": email.to_uppercase() }))
        .await;

    assert_eq!(response.status_code(), StatusCode::ACCEPTED);
    assert_eq!(
        response.json::<Value>()["message"],
        "Code de vérification envoyé par email"
    );

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, email);

    let stored = app
        .codes
        .get(CodePurpose::Registration, &email)
        .await
        .unwrap()
        .expect("pending entry kept");
    assert_eq!(stored.code, sent[0].1);
    assert_eq!(stored.code.len(), 6);
    assert!(stored.registration.is_some());
}

#[tokio::test]
async fn test_verify_registration_without_pending_entry() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/v1/auth/verify-registration")
        .json(&json!({ "email": unique_email(), "code": "123456" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["message"], "Code invalide ou expiré");
}

#[tokio::test]
async fn test_verify_registration_wrong_code_keeps_pending_entry() {
    let app = TestApp::new();
    let email = unique_email();
    app.seed_pending_registration(&email, "123456").await;

    let response = app
        .server
        .post("/api/v1/auth/verify-registration")
        .json(&json!({ "email": email, "code": "654321" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["message"], "Code invalide");
    assert!(app
        .codes
        .get(CodePurpose::Registration, &email)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_verify_reset_code_accepts_matching_code() {
    let app = TestApp::new();
    let email = unique_email();
    app.seed_reset_code(&email, "424242").await;

    let response = app
        .server
        .post("/api/v1/auth/verify-code")
        .json(&json!({ "email": email, "code": " 424242 " }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["message"], "Code vérifié avec succès");
    // Checking a code does not consume it
    assert!(app
        .codes
        .get(CodePurpose::PasswordReset, &email)
        .await
        .unwrap()
        .is_some());
}

#[test_case(true ; "wrong code")]
#[test_case(false ; "no code issued")]
#[tokio::test]
async fn test_verify_reset_code_rejects(seed: bool) {
    let app = TestApp::new();
    let email = unique_email();
    if seed {
        app.seed_reset_code(&email, "424242").await;
    }

    let response = app
        .server
        .post("/api/v1/auth/verify-code")
        .json(&json!({ "email": email, "code": "000000" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["message"], "Code invalide ou expiré");
}

#[tokio::test]
async fn test_reset_password_with_wrong_code_is_unauthorized() {
    let app = TestApp::new();
    let email = unique_email();
    app.seed_reset_code(&email, "424242").await;

    let response = app
        .server
        .post("/api/v1/auth/reset-password")
        .json(&json!({ "email": email, "code": "111111", "new_password": "Nouveau123!" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reset_password_short_password_is_rejected() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/v1/auth/reset-password")
        .json(&json!({ "email": unique_email(), "code": "424242", "new_password": "abc" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_google_login_with_rejected_token() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/v1/auth/google")
        .json(&json!({ "id_token": "forged" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["message"], "Token Google invalide");
}

#[tokio::test]
async fn test_logout_always_succeeds() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/v1/auth/logout")
        .json(&json!({ "refresh_token": "unknown.token" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
}
