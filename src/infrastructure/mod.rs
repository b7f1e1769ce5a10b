//! Infrastructure Layer
//!
//! Implementations for external services:
//! - Database repositories (PostgreSQL)
//! - Verification code storage (in-memory or Redis)
//! - Outgoing email (SMTP)
//! - Google ID token verification
//! - Prometheus metrics

pub mod cache;
pub mod database;
pub mod email;
pub mod metrics;
pub mod oauth;
pub mod repositories;
