//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **AuthService**: Registration codes, login, JWT tokens, password reset
//! - **UserService**: Profile, password, location and grades
//! - **PlanService**: Action plan bootstrap, answers and progress
//! - **CatalogService**: Formations and the académie directory

pub mod auth_service;
pub mod catalog_service;
pub mod plan_service;
pub mod user_service;

// Re-export auth service types
pub use auth_service::{
    decode_access_token, AuthDeps, AuthError, AuthService, AuthServiceImpl, AuthTokens, Claims,
};

// Re-export user service types
pub use user_service::{UserError, UserService, UserServiceImpl};

// Re-export plan service types
pub use plan_service::{bootstrap_plan, PlanError, PlanService, PlanServiceImpl};

// Re-export catalog service types
pub use catalog_service::{CatalogError, CatalogService, CatalogServiceImpl};
