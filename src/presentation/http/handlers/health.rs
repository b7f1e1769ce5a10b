//! Health Check Handlers
//!
//! - `GET /` - welcome message
//! - `GET /health` - static "healthy" with the build version
//! - `GET /health/live` - liveness probe
//! - `GET /health/ready` - readiness probe: database, optional Redis and the
//!   seeded action plan template new accounts are attached to

use std::future::Future;
use std::time::{Duration, Instant};

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::domain::PlanRepository;
use crate::infrastructure::repositories::PgPlanRepository;
use crate::startup::AppState;

static SERVER_START: Lazy<Instant> = Lazy::new(Instant::now);
static SERVER_START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Latency above which a dependency is reported as degraded
const DATABASE_SLOW: Duration = Duration::from_millis(100);
const REDIS_SLOW: Duration = Duration::from_millis(50);

/// Pin the start time (call during startup)
pub fn init_server_start() {
    Lazy::force(&SERVER_START);
    Lazy::force(&SERVER_START_TIME);
}

#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub started_at: String,
    pub checks: ReadinessChecks,
}

#[derive(Debug, Serialize)]
pub struct ReadinessChecks {
    pub database: ServiceHealth,
    /// Absent when no Redis is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis: Option<ServiceHealth>,
    /// Absent when the database itself is unreachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_plan: Option<ServiceHealth>,
}

#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ServiceHealth {
    fn unhealthy(message: String) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            latency_ms: None,
            message: Some(message),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the Student Management API",
    })
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "alive" })
}

/// 200 while the API can serve traffic, 503 when the database is down
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let database = probe(DATABASE_SLOW, "Database", async {
        sqlx::query("SELECT 1").execute(&state.db).await.map(|_| ())
    })
    .await;

    let redis = match state.redis.clone() {
        Some(mut conn) => Some(
            probe(REDIS_SLOW, "Redis", async move {
                redis::cmd("PING")
                    .query_async::<String>(&mut conn)
                    .await
                    .map(|_| ())
            })
            .await,
        ),
        None => None,
    };

    let action_plan = if database.status == HealthStatus::Unhealthy {
        None
    } else {
        Some(check_plan_template(&state).await)
    };

    let status = overall_status(&database, redis.as_ref(), action_plan.as_ref());
    let code = match status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };

    let response = ReadinessResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: SERVER_START.elapsed().as_secs(),
        started_at: SERVER_START_TIME.to_rfc3339(),
        checks: ReadinessChecks {
            database,
            redis,
            action_plan,
        },
    };

    (code, Json(response))
}

/// Time a dependency call and grade it against `slow`
async fn probe<F, E>(slow: Duration, name: &str, call: F) -> ServiceHealth
where
    F: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    let start = Instant::now();
    match call.await {
        Ok(()) => {
            let elapsed = start.elapsed();
            ServiceHealth {
                status: grade_latency(elapsed, slow),
                latency_ms: Some(elapsed.as_millis() as u64),
                message: None,
            }
        }
        Err(e) => ServiceHealth::unhealthy(format!("{} connection failed: {}", name, e)),
    }
}

fn grade_latency(elapsed: Duration, slow: Duration) -> HealthStatus {
    if elapsed < slow {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    }
}

/// Registration cannot attach a plan until the default template is seeded
async fn check_plan_template(state: &AppState) -> ServiceHealth {
    let repo = PgPlanRepository::new(state.db.clone());
    match repo.find_default_plan().await {
        Ok(Some(_)) => ServiceHealth {
            status: HealthStatus::Healthy,
            latency_ms: None,
            message: None,
        },
        Ok(None) => ServiceHealth {
            status: HealthStatus::Degraded,
            latency_ms: None,
            message: Some("Default action plan is not seeded".into()),
        },
        Err(e) => ServiceHealth::unhealthy(format!("Action plan lookup failed: {}", e)),
    }
}

/// Database down is fatal; anything else only degrades
fn overall_status(
    database: &ServiceHealth,
    redis: Option<&ServiceHealth>,
    action_plan: Option<&ServiceHealth>,
) -> HealthStatus {
    if database.status == HealthStatus::Unhealthy {
        return HealthStatus::Unhealthy;
    }

    let all_healthy = [Some(database), redis, action_plan]
        .into_iter()
        .flatten()
        .all(|check| check.status == HealthStatus::Healthy);

    if all_healthy {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn check(status: HealthStatus) -> ServiceHealth {
        ServiceHealth {
            status,
            latency_ms: None,
            message: None,
        }
    }

    #[test]
    fn test_health_status_serialization() {
        let json = serde_json::to_string(&HealthStatus::Degraded).unwrap();
        assert_eq!(json, "\"degraded\"");
    }

    #[test]
    fn test_grade_latency() {
        let slow = Duration::from_millis(100);
        assert_eq!(grade_latency(Duration::from_millis(3), slow), HealthStatus::Healthy);
        assert_eq!(grade_latency(Duration::from_millis(250), slow), HealthStatus::Degraded);
    }

    #[test]
    fn test_database_down_is_unhealthy() {
        let healthy = check(HealthStatus::Healthy);
        assert_eq!(
            overall_status(&check(HealthStatus::Unhealthy), Some(&healthy), None),
            HealthStatus::Unhealthy
        );
    }

    #[test]
    fn test_optional_checks_only_degrade() {
        let healthy = check(HealthStatus::Healthy);
        let unhealthy = check(HealthStatus::Unhealthy);
        let degraded = check(HealthStatus::Degraded);

        assert_eq!(overall_status(&healthy, None, None), HealthStatus::Healthy);
        assert_eq!(
            overall_status(&healthy, Some(&healthy), Some(&healthy)),
            HealthStatus::Healthy
        );
        assert_eq!(
            overall_status(&healthy, Some(&unhealthy), None),
            HealthStatus::Degraded
        );
        assert_eq!(
            overall_status(&healthy, None, Some(&degraded)),
            HealthStatus::Degraded
        );
        assert_eq!(overall_status(&degraded, None, None), HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn test_probe_reports_failure_message() {
        let health = probe(DATABASE_SLOW, "Database", async {
            Err::<(), _>("connection refused")
        })
        .await;

        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert_eq!(
            health.message.as_deref(),
            Some("Database connection failed: connection refused")
        );
    }

    #[tokio::test]
    async fn test_probe_reports_latency_on_success() {
        let health = probe(REDIS_SLOW, "Redis", async { Ok::<(), String>(()) }).await;

        assert_eq!(health.status, HealthStatus::Healthy);
        assert!(health.latency_ms.is_some());
    }
}
