//! Database Module
//!
//! PostgreSQL connection pool, migrations and small query helpers.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use crate::config::DatabaseSettings;

/// Create a PostgreSQL connection pool
pub async fn create_pool(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout))
        .connect(&settings.url)
        .await
}

/// Create a pool that opens connections on first use.
///
/// Lets the router be built without a reachable database (tests, tooling).
pub fn create_lazy_pool(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout))
        .connect_lazy(&settings.url)
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Build an `ILIKE` pattern matching `term` anywhere, with LIKE wildcards
/// in the term escaped. Blank terms yield `None` (no filter).
pub fn like_pattern(term: Option<&str>) -> Option<String> {
    let term = term.map(str::trim).filter(|t| !t.is_empty())?;
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{escaped}%"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(None, None ; "absent")]
    #[test_case(Some("   "), None ; "blank")]
    #[test_case(Some("BTS"), Some("%BTS%") ; "plain")]
    #[test_case(Some(" licence "), Some("%licence%") ; "trimmed")]
    #[test_case(Some("100%"), Some("%100\\%%") ; "percent escaped")]
    #[test_case(Some("a_b"), Some("%a\\_b%") ; "underscore escaped")]
    fn test_like_pattern(input: Option<&str>, expected: Option<&str>) {
        assert_eq!(like_pattern(input).as_deref(), expected);
    }
}
