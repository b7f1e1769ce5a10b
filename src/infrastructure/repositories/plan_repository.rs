//! Action plan repository.
//!
//! Per-user rows (`user_plan_responses`, `user_step_answers`,
//! `user_step_progress`) carry a UNIQUE (user_id, ...) constraint, so every
//! write here is an upsert.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{
    PlanAction, PlanQuestion, PlanRepository, PlanSnapshot, PlanStep, QuestionResponse,
    StepAnswer, StepProgress,
};
use crate::shared::error::AppError;

#[derive(Clone)]
pub struct PgPlanRepository {
    pool: PgPool,
}

impl PgPlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanRepository for PgPlanRepository {
    async fn find_default_plan(&self) -> Result<Option<PlanAction>, AppError> {
        let row = sqlx::query_as::<_, PlanAction>(
            "SELECT id, nom FROM plan_actions ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_plan(&self, plan_id: i64) -> Result<Option<PlanAction>, AppError> {
        let row = sqlx::query_as::<_, PlanAction>("SELECT id, nom FROM plan_actions WHERE id = $1")
            .bind(plan_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn find_steps(&self, plan_id: i64) -> Result<Vec<PlanStep>, AppError> {
        let rows = sqlx::query_as::<_, PlanStep>(
            r#"
            SELECT id, plan_action_id, titre, position
            FROM plan_steps
            WHERE plan_action_id = $1
            ORDER BY position
            "#,
        )
        .bind(plan_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn assign_plan(
        &self,
        user_id: i64,
        plan_id: i64,
        step_ids: &[i64],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE users SET plan_action_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(plan_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO user_step_progress (user_id, step_id, is_completed)
            SELECT $1, step_id, FALSE FROM UNNEST($2::BIGINT[]) AS step_id
            ON CONFLICT (user_id, step_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(step_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn load_snapshot(&self, user_id: i64, plan_id: i64) -> Result<PlanSnapshot, AppError> {
        let steps = self.find_steps(plan_id).await?;

        let questions = sqlx::query_as::<_, PlanQuestion>(
            r#"
            SELECT q.id, q.step_id, q.contenu, q.position
            FROM plan_questions q
            JOIN plan_steps s ON s.id = q.step_id
            WHERE s.plan_action_id = $1
            ORDER BY s.position, q.position, q.id
            "#,
        )
        .bind(plan_id)
        .fetch_all(&self.pool)
        .await?;

        let responses = sqlx::query_as::<_, QuestionResponse>(
            r#"
            SELECT r.question_id, r.reponse
            FROM user_plan_responses r
            JOIN plan_questions q ON q.id = r.question_id
            JOIN plan_steps s ON s.id = q.step_id
            WHERE r.user_id = $1 AND s.plan_action_id = $2
            "#,
        )
        .bind(user_id)
        .bind(plan_id)
        .fetch_all(&self.pool)
        .await?;

        let answers = sqlx::query_as::<_, StepAnswer>(
            r#"
            SELECT a.step_id, a.response
            FROM user_step_answers a
            JOIN plan_steps s ON s.id = a.step_id
            WHERE a.user_id = $1 AND s.plan_action_id = $2
            "#,
        )
        .bind(user_id)
        .bind(plan_id)
        .fetch_all(&self.pool)
        .await?;

        let progress = sqlx::query_as::<_, StepProgress>(
            r#"
            SELECT p.step_id, p.is_completed, p.completed_at
            FROM user_step_progress p
            JOIN plan_steps s ON s.id = p.step_id
            WHERE p.user_id = $1 AND s.plan_action_id = $2
            "#,
        )
        .bind(user_id)
        .bind(plan_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(PlanSnapshot {
            steps,
            questions,
            responses,
            answers,
            progress,
        })
    }

    async fn save_responses(
        &self,
        user_id: i64,
        responses: &[QuestionResponse],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for response in responses {
            sqlx::query(
                r#"
                INSERT INTO user_plan_responses (user_id, question_id, reponse)
                VALUES ($1, $2, $3)
                ON CONFLICT (user_id, question_id) DO UPDATE SET
                    reponse = EXCLUDED.reponse,
                    updated_at = NOW()
                "#,
            )
            .bind(user_id)
            .bind(response.question_id)
            .bind(&response.reponse)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn save_step_answer(
        &self,
        user_id: i64,
        step_id: i64,
        response: Option<String>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO user_step_answers (user_id, step_id, response)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, step_id) DO UPDATE SET
                response = EXCLUDED.response,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(step_id)
        .bind(response)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_step_progress(
        &self,
        user_id: i64,
        step_id: i64,
        is_completed: bool,
    ) -> Result<StepProgress, AppError> {
        // Re-completing a step keeps its original completion time
        let row = sqlx::query_as::<_, StepProgress>(
            r#"
            INSERT INTO user_step_progress (user_id, step_id, is_completed, completed_at)
            VALUES ($1, $2, $3, CASE WHEN $3 THEN NOW() ELSE NULL END)
            ON CONFLICT (user_id, step_id) DO UPDATE SET
                is_completed = EXCLUDED.is_completed,
                completed_at = CASE
                    WHEN EXCLUDED.is_completed
                        THEN COALESCE(user_step_progress.completed_at, EXCLUDED.completed_at)
                    ELSE NULL
                END
            RETURNING step_id, is_completed, completed_at
            "#,
        )
        .bind(user_id)
        .bind(step_id)
        .bind(is_completed)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}
