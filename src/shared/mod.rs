//! Shared Utilities
//!
//! Common utilities used across all layers.

pub mod code;
pub mod error;
pub mod serde_helpers;
pub mod validation;
