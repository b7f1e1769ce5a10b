//! # Domain Layer
//!
//! Entities and repository traits of the orientation platform. Independent of
//! HTTP and of the storage engine: repository traits define the data access
//! contracts and are implemented in `infrastructure`.

pub mod entities;

pub use entities::*;
