//! Action Plan Handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{
    SaveResponsesRequest, StepAnswerRequest, StepProgressRequest,
};
use crate::application::dto::response::PlanResponse;
use crate::application::services::{PlanService, PlanServiceImpl};
use crate::domain::{QuestionResponse, StepProgress};
use crate::infrastructure::repositories::{PgPlanRepository, PgUserRepository};
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

fn plan_service(state: &AppState) -> PlanServiceImpl<PgUserRepository, PgPlanRepository> {
    PlanServiceImpl::new(
        Arc::new(PgUserRepository::new(state.db.clone())),
        Arc::new(PgPlanRepository::new(state.db.clone())),
    )
}

/// The user's plan with answers and progress
pub async fn get_plan(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<PlanResponse>, AppError> {
    Ok(Json(plan_service(&state).get_plan(auth.user_id).await?))
}

pub async fn save_responses(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<SaveResponsesRequest>,
) -> Result<Json<PlanResponse>, AppError> {
    let responses = body
        .reponses
        .into_iter()
        .map(|r| QuestionResponse {
            question_id: r.question_id,
            reponse: r.reponse,
        })
        .collect();

    Ok(Json(
        plan_service(&state)
            .save_responses(auth.user_id, responses)
            .await?,
    ))
}

pub async fn save_step_answer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(step_id): Path<i64>,
    ValidatedJson(body): ValidatedJson<StepAnswerRequest>,
) -> Result<StatusCode, AppError> {
    plan_service(&state)
        .save_step_answer(auth.user_id, step_id, body.response)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_step_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(step_id): Path<i64>,
    Json(body): Json<StepProgressRequest>,
) -> Result<Json<StepProgress>, AppError> {
    Ok(Json(
        plan_service(&state)
            .set_step_progress(auth.user_id, step_id, body.is_completed)
            .await?,
    ))
}
