//! REST API endpoint tests

mod auth_tests;
mod catalog_tests;
mod health_tests;
mod protected_tests;
