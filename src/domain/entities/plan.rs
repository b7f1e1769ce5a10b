//! Action plan entities and repository trait.
//!
//! A plan ("plan d'action") is an ordered list of steps, each step holding a
//! few guidance questions. Users answer questions, write a free-text answer
//! per step and tick steps off as they progress.
//!
//! Tables: `plan_actions`, `plan_steps`, `plan_questions`,
//! `user_plan_responses`, `user_step_answers`, `user_step_progress`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Number of steps in the default plan every new account receives.
pub const DEFAULT_PLAN_STEP_COUNT: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlanAction {
    pub id: i64,
    pub nom: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlanStep {
    pub id: i64,
    pub plan_action_id: i64,
    pub titre: String,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlanQuestion {
    pub id: i64,
    pub step_id: i64,
    pub contenu: String,
    pub position: i32,
}

/// A user's answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct QuestionResponse {
    pub question_id: i64,
    pub reponse: Option<String>,
}

/// A user's free-text answer for a whole step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StepAnswer {
    pub step_id: i64,
    pub response: Option<String>,
}

/// Completion state of one step for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StepProgress {
    pub step_id: i64,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Everything needed to render a user's plan.
#[derive(Debug, Clone, Default)]
pub struct PlanSnapshot {
    pub steps: Vec<PlanStep>,
    pub questions: Vec<PlanQuestion>,
    pub responses: Vec<QuestionResponse>,
    pub answers: Vec<StepAnswer>,
    pub progress: Vec<StepProgress>,
}

/// Repository trait for action plan data access.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// The plan assigned to new accounts (lowest id).
    async fn find_default_plan(&self) -> Result<Option<PlanAction>, AppError>;

    async fn find_plan(&self, plan_id: i64) -> Result<Option<PlanAction>, AppError>;

    /// Steps of a plan ordered by position.
    async fn find_steps(&self, plan_id: i64) -> Result<Vec<PlanStep>, AppError>;

    /// Assign the plan to the user and create one progress row per step,
    /// in a single transaction. Existing progress rows are left untouched.
    async fn assign_plan(
        &self,
        user_id: i64,
        plan_id: i64,
        step_ids: &[i64],
    ) -> Result<(), AppError>;

    /// Load steps, questions and the user's answers/progress for a plan.
    async fn load_snapshot(&self, user_id: i64, plan_id: i64) -> Result<PlanSnapshot, AppError>;

    /// Upsert answers to questions.
    async fn save_responses(
        &self,
        user_id: i64,
        responses: &[QuestionResponse],
    ) -> Result<(), AppError>;

    /// Upsert the free-text answer of a step.
    async fn save_step_answer(
        &self,
        user_id: i64,
        step_id: i64,
        response: Option<String>,
    ) -> Result<(), AppError>;

    /// Upsert the completion flag of a step.
    async fn set_step_progress(
        &self,
        user_id: i64,
        step_id: i64,
        is_completed: bool,
    ) -> Result<StepProgress, AppError>;
}
