//! Repository Implementations
//!
//! PostgreSQL implementations of the domain repository traits. Each
//! repository owns a clone of the connection pool.
//!
//! ## Available Repositories
//!
//! - **PgUserRepository** - accounts and profile updates
//! - **PgSessionRepository** - refresh token sessions
//! - **PgProfileRepository** - location and grade rows
//! - **PgPlanRepository** - action plan, answers and progress
//! - **PgFormationRepository** - formation catalog with satellites
//! - **PgAcademieRepository** - academies and etablissements
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use crate::infrastructure::repositories::{PgUserRepository, PgPlanRepository};
//!
//! async fn setup_repositories(pool: PgPool) {
//!     let user_repo = PgUserRepository::new(pool.clone());
//!     let plan_repo = PgPlanRepository::new(pool.clone());
//! }
//! ```

pub mod academie_repository;
pub mod formation_repository;
pub mod plan_repository;
pub mod profile_repository;
pub mod session_repository;
pub mod user_repository;

pub use academie_repository::PgAcademieRepository;
pub use formation_repository::PgFormationRepository;
pub use plan_repository::PgPlanRepository;
pub use profile_repository::PgProfileRepository;
pub use session_repository::PgSessionRepository;
pub use user_repository::PgUserRepository;
