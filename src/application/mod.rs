//! Application Layer
//!
//! Services for accounts, profiles, action plans and the catalog, plus the
//! request/response DTOs the HTTP handlers exchange with them.

pub mod services;
pub mod dto;
