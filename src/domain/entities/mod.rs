//! # Domain Entities
//!
//! Core business objects of the orientation platform. Every entity maps to a
//! database table and comes with a repository trait that the infrastructure
//! layer implements.
//!
//! - **User**: student account, profile columns and authentication data
//! - **Location / Moyenne**: per-user address and grade averages
//! - **Session**: refresh token sessions
//! - **Plan**: action plan, its steps, questions and the user's progress
//! - **Formation**: read-only program catalog with its satellite tables
//! - **Academie / Etablissement**: read-only school directory

mod academie;
mod formation;
mod plan;
mod profile;
mod session;
mod user;

pub use academie::{
    Academie, AcademieRepository, AcademieSummary, Etablissement, EtablissementFilter,
};
pub use formation::*;
pub use plan::{
    PlanAction, PlanQuestion, PlanRepository, PlanSnapshot, PlanStep, QuestionResponse,
    StepAnswer, StepProgress, DEFAULT_PLAN_STEP_COUNT,
};
pub use profile::{Location, LocationPatch, Moyenne, MoyennePatch, ProfileRepository};
pub use session::{Session, SessionRepository};
pub use user::{AuthProvider, NewUser, User, UserPatch, UserProfile, UserRepository};

#[cfg(test)]
pub use academie::MockAcademieRepository;
#[cfg(test)]
pub use plan::MockPlanRepository;
#[cfg(test)]
pub use profile::MockProfileRepository;
#[cfg(test)]
pub use session::MockSessionRepository;
#[cfg(test)]
pub use user::MockUserRepository;
