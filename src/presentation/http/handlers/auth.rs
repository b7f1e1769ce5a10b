//! Authentication Handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::application::dto::request::{
    EmailRequest, GoogleLoginRequest, LoginRequest, RefreshTokenRequest, RegisterRequest,
    ResetPasswordRequest, VerifyCodeRequest,
};
use crate::application::dto::response::{AuthResponse, MessageResponse, TokenResponse};
use crate::application::services::{AuthService, AuthServiceImpl};
use crate::infrastructure::repositories::{PgPlanRepository, PgSessionRepository, PgUserRepository};
use crate::presentation::http::extractors::ValidatedJson;
use crate::shared::error::AppError;
use crate::startup::AppState;

const CODE_SENT: &str = "Code de vérification envoyé par email";

fn auth_service(
    state: &AppState,
) -> AuthServiceImpl<PgUserRepository, PgSessionRepository, PgPlanRepository> {
    AuthServiceImpl::new(
        Arc::new(PgUserRepository::new(state.db.clone())),
        Arc::new(PgSessionRepository::new(state.db.clone())),
        Arc::new(PgPlanRepository::new(state.db.clone())),
        state.auth_deps(),
        state.settings.jwt.clone(),
        state.settings.registration.clone(),
    )
}

/// Start a registration: the account is created once the emailed code is confirmed
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    auth_service(&state).register(body).await?;

    Ok((StatusCode::ACCEPTED, Json(MessageResponse::new(CODE_SENT))))
}

/// Send a new code for a pending registration
pub async fn resend_code(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<EmailRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    auth_service(&state)
        .resend_registration_code(&body.email)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(MessageResponse::new(CODE_SENT))))
}

/// Confirm the registration code and create the account
pub async fn verify_registration(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<VerifyCodeRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let (profile, tokens) = auth_service(&state)
        .verify_registration(&body.email, &body.code)
        .await?;

    Ok((StatusCode::CREATED, Json(AuthResponse::new(profile, tokens))))
}

/// Login with credentials
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let (profile, tokens) = auth_service(&state)
        .login(&body.email, &body.password)
        .await?;

    Ok(Json(AuthResponse::new(profile, tokens)))
}

/// Refresh access token
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let tokens = auth_service(&state)
        .refresh_token(&body.refresh_token)
        .await?;

    Ok(Json(TokenResponse::from(tokens)))
}

/// Logout (revoke refresh token)
pub async fn logout(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<StatusCode, AppError> {
    // Revoke token (errors are logged, never returned)
    let _ = auth_service(&state).logout(&body.refresh_token).await;

    Ok(StatusCode::NO_CONTENT)
}

/// Sign in with a Google ID token
pub async fn google_login(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<GoogleLoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let (profile, tokens) = auth_service(&state).google_login(&body.id_token).await?;

    Ok(Json(AuthResponse::new(profile, tokens)))
}

/// Email a password reset code
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<EmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    auth_service(&state).forgot_password(&body.email).await?;

    Ok(Json(MessageResponse::new(CODE_SENT)))
}

pub async fn verify_reset_code(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<VerifyCodeRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    auth_service(&state)
        .verify_reset_code(&body.email, &body.code)
        .await?;

    Ok(Json(MessageResponse::new("Code vérifié avec succès")))
}

pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    auth_service(&state)
        .reset_password(&body.email, &body.code, &body.new_password)
        .await?;

    Ok(Json(MessageResponse::new(
        "Mot de passe réinitialisé avec succès",
    )))
}
