//! # Orientation Server
//!
//! This is the application entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Database connection pool and migrations
//! - Code store, mailer and Google verifier
//! - HTTP server

use anyhow::Result;
use tracing::info;

use orientation_server::config::Settings;
use orientation_server::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for structured logging
    orientation_server::telemetry::init_tracing();

    info!("Starting Orientation Server...");

    // Load configuration from environment and config files
    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        code_store = ?settings.registration.store,
        email_enabled = settings.email.enabled,
        google_login = !settings.google.client_id.is_empty(),
        "Configuration loaded"
    );

    // Build and run the application
    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
