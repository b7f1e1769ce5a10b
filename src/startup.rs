//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;

use crate::application::services::AuthDeps;
use crate::config::{CodeStoreBackend, Settings};
use crate::infrastructure::cache::{self, CodeStore, InMemoryCodeStore, RedisCodeStore};
use crate::infrastructure::database;
use crate::infrastructure::email::{LogMailer, Mailer, SmtpMailer};
use crate::infrastructure::metrics;
use crate::infrastructure::oauth::{GoogleTokenVerifier, GoogleVerifier};
use crate::presentation::http::{handlers, routes};
use crate::presentation::middleware::{cors, logging};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub settings: Arc<Settings>,
    pub codes: Arc<dyn CodeStore>,
    pub mailer: Arc<dyn Mailer>,
    pub google: Arc<dyn GoogleVerifier>,
    /// Only present when a Redis URL is configured
    pub redis: Option<ConnectionManager>,
}

impl AppState {
    /// Collaborators of the auth service
    pub fn auth_deps(&self) -> AuthDeps {
        AuthDeps {
            codes: self.codes.clone(),
            mailer: self.mailer.clone(),
            google: self.google.clone(),
        }
    }
}

/// Full router with every middleware layer.
pub fn build_router(state: AppState) -> Router {
    let cors = cors::create_cors_layer(&state.settings.cors);

    routes::create_router(state).layer(
        ServiceBuilder::new()
            .layer(logging::create_trace_layer())
            .layer(cors)
            .layer(CompressionLayer::new()),
    )
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        handlers::health::init_server_start();

        // Create database pool
        let db = database::create_pool(&settings.database).await?;
        tracing::info!("Database connection pool created");

        if settings.database.run_migrations {
            database::run_migrations(&db).await?;
        }

        // Redis is optional
        let redis = match &settings.redis.url {
            Some(url) => Some(cache::create_redis_client(url).await?),
            None => None,
        };

        let codes: Arc<dyn CodeStore> = match (settings.registration.store, &redis) {
            (CodeStoreBackend::Redis, Some(conn)) => {
                tracing::info!("Pending codes kept in Redis");
                Arc::new(RedisCodeStore::new(conn.clone()))
            }
            _ => {
                tracing::info!("Pending codes kept in memory");
                let store = Arc::new(InMemoryCodeStore::new());
                spawn_code_sweeper(store.clone());
                store as Arc<dyn CodeStore>
            }
        };

        let mailer: Arc<dyn Mailer> = if settings.email.enabled {
            Arc::new(SmtpMailer::new(&settings.email)?)
        } else {
            tracing::warn!("Email delivery disabled, codes will only be logged");
            Arc::new(LogMailer)
        };

        let google: Arc<dyn GoogleVerifier> = Arc::new(GoogleTokenVerifier::new(&settings.google)?);

        spawn_pool_stats(db.clone());

        let state = AppState {
            db,
            settings: Arc::new(settings.clone()),
            codes,
            mailer,
            google,
            redis,
        };

        let router = build_router(state);

        // Bind to address
        let addr: SocketAddr = settings.server_addr().parse()?;
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// Periodically drop expired entries from the in-memory code store
fn spawn_code_sweeper(store: Arc<InMemoryCodeStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let swept = store.sweep_expired();
            if swept > 0 {
                tracing::debug!(swept, remaining = store.len(), "Expired verification codes swept");
            }
        }
    });
}

/// Export pool gauges every few seconds
fn spawn_pool_stats(db: PgPool) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(15));
        loop {
            interval.tick().await;
            let idle = db.num_idle() as u32;
            let active = db.size().saturating_sub(idle);
            metrics::update_db_pool_stats(idle, active);
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
