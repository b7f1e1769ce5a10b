//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints.

pub mod auth;
pub mod catalog;
pub mod health;
pub mod plan;
pub mod user;
