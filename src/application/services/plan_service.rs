//! Action Plan Service
//!
//! Assigns the default plan to new accounts and serves the user's plan with
//! answers and progress.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::application::dto::response::{PlanQuestionResponse, PlanResponse, PlanStepResponse};
use crate::domain::{
    PlanAction, PlanRepository, PlanSnapshot, QuestionResponse, StepProgress, UserRepository,
    DEFAULT_PLAN_STEP_COUNT,
};
use crate::shared::error::AppError;

#[async_trait]
pub trait PlanService: Send + Sync {
    /// Assign the default plan and create its progress rows. Idempotent.
    async fn bootstrap(&self, user_id: i64) -> Result<i64, PlanError>;

    /// The user's plan; users without a plan get one on first read.
    async fn get_plan(&self, user_id: i64) -> Result<PlanResponse, PlanError>;

    async fn save_responses(
        &self,
        user_id: i64,
        responses: Vec<QuestionResponse>,
    ) -> Result<PlanResponse, PlanError>;

    async fn save_step_answer(
        &self,
        user_id: i64,
        step_id: i64,
        response: Option<String>,
    ) -> Result<(), PlanError>;

    async fn set_step_progress(
        &self,
        user_id: i64,
        step_id: i64,
        is_completed: bool,
    ) -> Result<StepProgress, PlanError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("User not found")]
    UserNotFound,

    #[error("Plan not found")]
    PlanNotFound,

    #[error("No default plan configured")]
    NoDefaultPlan,

    #[error("Step {0} is not part of the user's plan")]
    StepNotFound(i64),

    #[error("Question {0} is not part of the user's plan")]
    UnknownQuestion(i64),

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<PlanError> for AppError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::UserNotFound => AppError::NotFound("Utilisateur non trouvé".into()),
            PlanError::PlanNotFound => AppError::NotFound("Plan d'action non trouvé".into()),
            PlanError::NoDefaultPlan => {
                AppError::Internal("Aucun plan d'action par défaut n'est configuré".into())
            }
            PlanError::StepNotFound(_) => AppError::NotFound("Étape non trouvée".into()),
            PlanError::UnknownQuestion(id) => AppError::BadRequest(format!(
                "La question {} n'appartient pas à votre plan d'action",
                id
            )),
            PlanError::Repository(e) => e,
        }
    }
}

/// Assign the default plan to a user and create one progress row per step.
///
/// Shared by account creation (registration, Google sign-in) and the lazy
/// path of [`PlanService::get_plan`].
#[instrument(skip(repo))]
pub async fn bootstrap_plan<P>(repo: &P, user_id: i64) -> Result<i64, PlanError>
where
    P: PlanRepository + ?Sized,
{
    let plan = repo
        .find_default_plan()
        .await?
        .ok_or(PlanError::NoDefaultPlan)?;
    let steps = repo.find_steps(plan.id).await?;

    if steps.len() != DEFAULT_PLAN_STEP_COUNT {
        warn!(
            plan_id = plan.id,
            steps = steps.len(),
            "Default plan does not have the expected number of steps"
        );
    }

    let step_ids: Vec<i64> = steps.iter().map(|s| s.id).collect();
    repo.assign_plan(user_id, plan.id, &step_ids).await?;

    debug!(plan_id = plan.id, steps = step_ids.len(), "Action plan assigned");
    Ok(plan.id)
}

/// Merge plan structure with the user's answers and progress.
pub fn build_plan_response(plan: PlanAction, snapshot: PlanSnapshot) -> PlanResponse {
    let PlanSnapshot {
        steps,
        questions,
        responses,
        answers,
        progress,
    } = snapshot;

    let mut reponses: HashMap<i64, Option<String>> = responses
        .into_iter()
        .map(|r| (r.question_id, r.reponse))
        .collect();
    let mut step_answers: HashMap<i64, Option<String>> =
        answers.into_iter().map(|a| (a.step_id, a.response)).collect();
    let progress: HashMap<i64, StepProgress> =
        progress.into_iter().map(|p| (p.step_id, p)).collect();

    let mut questions_by_step: HashMap<i64, Vec<PlanQuestionResponse>> = HashMap::new();
    for question in questions {
        questions_by_step
            .entry(question.step_id)
            .or_default()
            .push(PlanQuestionResponse {
                id: question.id,
                contenu: question.contenu,
                reponse: reponses.remove(&question.id).flatten(),
            });
    }

    let steps: Vec<PlanStepResponse> = steps
        .into_iter()
        .map(|step| {
            let state = progress.get(&step.id);
            PlanStepResponse {
                id: step.id,
                titre: step.titre,
                position: step.position,
                is_completed: state.map(|p| p.is_completed).unwrap_or(false),
                completed_at: state.and_then(|p| p.completed_at),
                answer: step_answers.remove(&step.id).flatten(),
                questions: questions_by_step.remove(&step.id).unwrap_or_default(),
            }
        })
        .collect();

    let total_steps = steps.len();
    let completed_steps = steps.iter().filter(|s| s.is_completed).count();
    let progress_percent = if total_steps == 0 {
        0
    } else {
        (completed_steps * 100 / total_steps) as u8
    };

    PlanResponse {
        id: plan.id,
        nom: plan.nom,
        steps,
        completed_steps,
        total_steps,
        progress_percent,
    }
}

pub struct PlanServiceImpl<U, P>
where
    U: UserRepository,
    P: PlanRepository,
{
    user_repo: Arc<U>,
    plan_repo: Arc<P>,
}

impl<U, P> PlanServiceImpl<U, P>
where
    U: UserRepository,
    P: PlanRepository,
{
    pub fn new(user_repo: Arc<U>, plan_repo: Arc<P>) -> Self {
        Self {
            user_repo,
            plan_repo,
        }
    }

    /// Plan id of the user, bootstrapping one if missing.
    async fn plan_id_for(&self, user_id: i64) -> Result<i64, PlanError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(PlanError::UserNotFound)?;

        match user.plan_action_id {
            Some(plan_id) => Ok(plan_id),
            None => bootstrap_plan(self.plan_repo.as_ref(), user_id).await,
        }
    }

    async fn ensure_step_in_plan(&self, user_id: i64, step_id: i64) -> Result<(), PlanError> {
        let plan_id = self.plan_id_for(user_id).await?;
        let steps = self.plan_repo.find_steps(plan_id).await?;

        if steps.iter().any(|s| s.id == step_id) {
            Ok(())
        } else {
            Err(PlanError::StepNotFound(step_id))
        }
    }

    async fn load_plan(&self, user_id: i64, plan_id: i64) -> Result<PlanResponse, PlanError> {
        let plan = self
            .plan_repo
            .find_plan(plan_id)
            .await?
            .ok_or(PlanError::PlanNotFound)?;
        let snapshot = self.plan_repo.load_snapshot(user_id, plan_id).await?;

        Ok(build_plan_response(plan, snapshot))
    }
}

#[async_trait]
impl<U, P> PlanService for PlanServiceImpl<U, P>
where
    U: UserRepository + 'static,
    P: PlanRepository + 'static,
{
    async fn bootstrap(&self, user_id: i64) -> Result<i64, PlanError> {
        bootstrap_plan(self.plan_repo.as_ref(), user_id).await
    }

    #[instrument(skip(self))]
    async fn get_plan(&self, user_id: i64) -> Result<PlanResponse, PlanError> {
        let plan_id = self.plan_id_for(user_id).await?;
        self.load_plan(user_id, plan_id).await
    }

    #[instrument(skip(self, responses), fields(count = responses.len()))]
    async fn save_responses(
        &self,
        user_id: i64,
        responses: Vec<QuestionResponse>,
    ) -> Result<PlanResponse, PlanError> {
        let plan_id = self.plan_id_for(user_id).await?;
        let snapshot = self.plan_repo.load_snapshot(user_id, plan_id).await?;

        let known: HashSet<i64> = snapshot.questions.iter().map(|q| q.id).collect();
        if let Some(unknown) = responses.iter().find(|r| !known.contains(&r.question_id)) {
            return Err(PlanError::UnknownQuestion(unknown.question_id));
        }

        self.plan_repo.save_responses(user_id, &responses).await?;
        self.load_plan(user_id, plan_id).await
    }

    #[instrument(skip(self, response))]
    async fn save_step_answer(
        &self,
        user_id: i64,
        step_id: i64,
        response: Option<String>,
    ) -> Result<(), PlanError> {
        self.ensure_step_in_plan(user_id, step_id).await?;
        self.plan_repo
            .save_step_answer(user_id, step_id, response)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_step_progress(
        &self,
        user_id: i64,
        step_id: i64,
        is_completed: bool,
    ) -> Result<StepProgress, PlanError> {
        self.ensure_step_in_plan(user_id, step_id).await?;
        let progress = self
            .plan_repo
            .set_step_progress(user_id, step_id, is_completed)
            .await?;
        Ok(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        MockPlanRepository, MockUserRepository, PlanQuestion, PlanStep, StepAnswer, User,
    };
    use chrono::Utc;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn default_plan() -> PlanAction {
        PlanAction {
            id: 1,
            nom: "Plan d'action orientation".into(),
        }
    }

    fn seeded_steps() -> Vec<PlanStep> {
        (1..=DEFAULT_PLAN_STEP_COUNT as i64)
            .map(|id| PlanStep {
                id,
                plan_action_id: 1,
                titre: format!("Étape {}", id),
                position: id as i32,
            })
            .collect()
    }

    fn user_with_plan(plan_action_id: Option<i64>) -> User {
        User {
            id: 42,
            plan_action_id,
            ..User::default()
        }
    }

    #[tokio::test]
    async fn test_bootstrap_assigns_every_step_of_default_plan() {
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_default_plan()
            .returning(|| Ok(Some(default_plan())));
        plan_repo
            .expect_find_steps()
            .with(eq(1))
            .returning(|_| Ok(seeded_steps()));
        plan_repo
            .expect_assign_plan()
            .withf(|user_id, plan_id, step_ids| {
                *user_id == 42 && *plan_id == 1 && step_ids == [1, 2, 3, 4, 5, 6]
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let plan_id = bootstrap_plan(&plan_repo, 42).await.unwrap();
        assert_eq!(plan_id, 1);
    }

    #[tokio::test]
    async fn test_bootstrap_without_default_plan_fails() {
        let mut plan_repo = MockPlanRepository::new();
        plan_repo.expect_find_default_plan().returning(|| Ok(None));
        plan_repo.expect_assign_plan().never();

        let result = bootstrap_plan(&plan_repo, 42).await;
        assert!(matches!(result, Err(PlanError::NoDefaultPlan)));
    }

    #[tokio::test]
    async fn test_get_plan_bootstraps_user_without_plan() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_id()
            .with(eq(42))
            .returning(|_| Ok(Some(user_with_plan(None))));

        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_default_plan()
            .returning(|| Ok(Some(default_plan())));
        plan_repo.expect_find_steps().returning(|_| Ok(seeded_steps()));
        plan_repo
            .expect_assign_plan()
            .times(1)
            .returning(|_, _, _| Ok(()));
        plan_repo
            .expect_find_plan()
            .with(eq(1))
            .returning(|_| Ok(Some(default_plan())));
        plan_repo.expect_load_snapshot().returning(|_, _| {
            Ok(PlanSnapshot {
                steps: seeded_steps(),
                ..PlanSnapshot::default()
            })
        });

        let service = PlanServiceImpl::new(Arc::new(user_repo), Arc::new(plan_repo));
        let plan = service.get_plan(42).await.unwrap();

        assert_eq!(plan.total_steps, DEFAULT_PLAN_STEP_COUNT);
        assert_eq!(plan.completed_steps, 0);
        assert_eq!(plan.progress_percent, 0);
    }

    #[test]
    fn test_build_plan_response_merges_answers_and_progress() {
        let now = Utc::now();
        let snapshot = PlanSnapshot {
            steps: seeded_steps()[..2].to_vec(),
            questions: vec![
                PlanQuestion {
                    id: 10,
                    step_id: 1,
                    contenu: "Quelles matières préfères-tu ?".into(),
                    position: 1,
                },
                PlanQuestion {
                    id: 11,
                    step_id: 2,
                    contenu: "Quels métiers t'attirent ?".into(),
                    position: 1,
                },
            ],
            responses: vec![QuestionResponse {
                question_id: 10,
                reponse: Some("Les maths".into()),
            }],
            answers: vec![StepAnswer {
                step_id: 2,
                response: Some("Ingénieure".into()),
            }],
            progress: vec![
                StepProgress {
                    step_id: 1,
                    is_completed: true,
                    completed_at: Some(now),
                },
                StepProgress {
                    step_id: 2,
                    is_completed: false,
                    completed_at: None,
                },
            ],
        };

        let plan = build_plan_response(default_plan(), snapshot);

        assert_eq!(plan.total_steps, 2);
        assert_eq!(plan.completed_steps, 1);
        assert_eq!(plan.progress_percent, 50);
        assert_eq!(
            plan.steps[0].questions,
            vec![PlanQuestionResponse {
                id: 10,
                contenu: "Quelles matières préfères-tu ?".into(),
                reponse: Some("Les maths".into()),
            }]
        );
        assert_eq!(plan.steps[0].completed_at, Some(now));
        assert_eq!(plan.steps[1].answer.as_deref(), Some("Ingénieure"));
        assert_eq!(plan.steps[1].questions[0].reponse, None);
    }

    #[test]
    fn test_progress_percent_rounds_down() {
        let snapshot = PlanSnapshot {
            steps: seeded_steps(),
            progress: vec![StepProgress {
                step_id: 3,
                is_completed: true,
                completed_at: None,
            }],
            ..PlanSnapshot::default()
        };

        let plan = build_plan_response(default_plan(), snapshot);
        // 1 of 6 steps
        assert_eq!(plan.progress_percent, 16);
    }

    #[tokio::test]
    async fn test_save_responses_rejects_foreign_question() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_id()
            .returning(|_| Ok(Some(user_with_plan(Some(1)))));

        let mut plan_repo = MockPlanRepository::new();
        plan_repo.expect_load_snapshot().returning(|_, _| {
            Ok(PlanSnapshot {
                steps: seeded_steps(),
                questions: vec![PlanQuestion {
                    id: 10,
                    step_id: 1,
                    contenu: "Question".into(),
                    position: 1,
                }],
                ..PlanSnapshot::default()
            })
        });
        plan_repo.expect_save_responses().never();

        let service = PlanServiceImpl::new(Arc::new(user_repo), Arc::new(plan_repo));
        let result = service
            .save_responses(
                42,
                vec![QuestionResponse {
                    question_id: 999,
                    reponse: Some("?".into()),
                }],
            )
            .await;

        assert!(matches!(result, Err(PlanError::UnknownQuestion(999))));
    }

    #[tokio::test]
    async fn test_set_progress_on_foreign_step_is_not_found() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_id()
            .returning(|_| Ok(Some(user_with_plan(Some(1)))));

        let mut plan_repo = MockPlanRepository::new();
        plan_repo.expect_find_steps().returning(|_| Ok(seeded_steps()));
        plan_repo.expect_set_step_progress().never();

        let service = PlanServiceImpl::new(Arc::new(user_repo), Arc::new(plan_repo));
        let result = service.set_step_progress(42, 77, true).await;

        assert!(matches!(result, Err(PlanError::StepNotFound(77))));
    }

    #[tokio::test]
    async fn test_set_progress_on_own_step() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_id()
            .returning(|_| Ok(Some(user_with_plan(Some(1)))));

        let mut plan_repo = MockPlanRepository::new();
        plan_repo.expect_find_steps().returning(|_| Ok(seeded_steps()));
        plan_repo
            .expect_set_step_progress()
            .with(eq(42), eq(3), eq(true))
            .times(1)
            .returning(|_, step_id, is_completed| {
                Ok(StepProgress {
                    step_id,
                    is_completed,
                    completed_at: Some(Utc::now()),
                })
            });

        let service = PlanServiceImpl::new(Arc::new(user_repo), Arc::new(plan_repo));
        let progress = service.set_step_progress(42, 3, true).await.unwrap();

        assert!(progress.is_completed);
        assert_eq!(progress.step_id, 3);
    }
}
