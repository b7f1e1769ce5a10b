//! User Handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::application::dto::request::{
    ChangePasswordRequest, LocationRequest, MoyenneRequest, UpdateProfileRequest,
};
use crate::application::dto::response::UserResponse;
use crate::application::services::{UserService, UserServiceImpl};
use crate::domain::{Location, Moyenne};
use crate::infrastructure::repositories::{PgProfileRepository, PgUserRepository};
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

fn user_service(state: &AppState) -> UserServiceImpl<PgUserRepository, PgProfileRepository> {
    UserServiceImpl::new(
        Arc::new(PgUserRepository::new(state.db.clone())),
        Arc::new(PgProfileRepository::new(state.db.clone())),
    )
}

/// Get current authenticated user
pub async fn get_current_user(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    let profile = user_service(&state).get_me(auth.user_id).await?;

    Ok(Json(UserResponse::from(profile)))
}

/// Partially update the current user
pub async fn update_current_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let profile = user_service(&state).update_me(auth.user_id, body).await?;

    Ok(Json(UserResponse::from(profile)))
}

pub async fn delete_current_user(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<StatusCode, AppError> {
    user_service(&state).delete_me(auth.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    user_service(&state)
        .change_password(auth.user_id, &body.current_password, &body.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_location(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Location>, AppError> {
    Ok(Json(user_service(&state).get_location(auth.user_id).await?))
}

pub async fn put_location(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<LocationRequest>,
) -> Result<Json<Location>, AppError> {
    Ok(Json(
        user_service(&state).put_location(auth.user_id, body).await?,
    ))
}

pub async fn get_moyenne(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Moyenne>, AppError> {
    Ok(Json(user_service(&state).get_moyenne(auth.user_id).await?))
}

pub async fn put_moyenne(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<MoyenneRequest>,
) -> Result<Json<Moyenne>, AppError> {
    Ok(Json(
        user_service(&state).put_moyenne(auth.user_id, body).await?,
    ))
}
