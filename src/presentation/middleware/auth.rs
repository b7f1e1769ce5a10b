//! Authentication Middleware
//!
//! JWT validation middleware for protected routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    RequestPartsExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::application::services::{decode_access_token, AuthError};
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Authenticated user extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = request.into_parts();

    // Extract the bearer token
    let TypedHeader(Authorization(bearer)) = parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|_| AppError::Unauthorized("Token d'authentification manquant".into()))?;

    // Decode and validate JWT
    let claims = decode_access_token(bearer.token(), &state.settings.jwt.secret).map_err(|e| {
        match e {
            AuthError::TokenExpired => AppError::Unauthorized("Token expiré".into()),
            _ => AppError::Unauthorized("Token invalide".into()),
        }
    })?;

    let user_id = claims
        .user_id()
        .map_err(|_| AppError::Unauthorized("Token invalide".into()))?;

    // Insert authenticated user into request extensions
    let mut request = Request::from_parts(parts, body);
    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}
