//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{get, patch, post, put},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::{auth_middleware, track_metrics};
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::root))
        .nest("/api/v1", api_routes(state.clone()))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .route_layer(middleware::from_fn(track_metrics))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API v1 routes
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Public routes
        .nest("/auth", auth_routes())
        .nest("/formations", formation_routes())
        .nest("/academies", academie_routes())
        // Protected routes (require authentication)
        .nest("/users", user_routes(state.clone()))
        .nest("/plan", plan_routes(state))
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/register/resend", post(handlers::auth::resend_code))
        .route(
            "/verify-registration",
            post(handlers::auth::verify_registration),
        )
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh_token))
        .route("/logout", post(handlers::auth::logout))
        .route("/google", post(handlers::auth::google_login))
        .route("/forgot-password", post(handlers::auth::forgot_password))
        .route("/verify-code", post(handlers::auth::verify_reset_code))
        .route("/reset-password", post(handlers::auth::reset_password))
}

/// User routes (protected)
fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/me",
            get(handlers::user::get_current_user)
                .patch(handlers::user::update_current_user)
                .delete(handlers::user::delete_current_user),
        )
        .route("/me/password", put(handlers::user::change_password))
        .route(
            "/me/location",
            get(handlers::user::get_location).put(handlers::user::put_location),
        )
        .route(
            "/me/moyenne",
            get(handlers::user::get_moyenne).put(handlers::user::put_moyenne),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Action plan routes (protected)
fn plan_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::plan::get_plan))
        .route("/responses", put(handlers::plan::save_responses))
        .route(
            "/steps/{step_id}/answer",
            put(handlers::plan::save_step_answer),
        )
        .route(
            "/steps/{step_id}/progress",
            patch(handlers::plan::set_step_progress),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Formation catalog (public, read-only)
fn formation_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::catalog::list_formations))
        .route("/{id}", get(handlers::catalog::get_formation))
}

/// Académie directory (public, read-only)
fn academie_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::catalog::list_academies))
        .route("/{id}", get(handlers::catalog::get_academie))
        .route(
            "/{id}/etablissements",
            get(handlers::catalog::list_etablissements),
        )
}
