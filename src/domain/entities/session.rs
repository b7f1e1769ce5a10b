//! User Session entity and repository trait.
//!
//! Maps to the `user_sessions` table in the database schema.
//! Used for refresh token management.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Represents a login session backing one refresh token.
///
/// Maps to the `user_sessions` table:
/// - id: UUID PRIMARY KEY
/// - user_id: BIGINT NOT NULL REFERENCES users(id)
/// - refresh_token_hash: VARCHAR(64) NOT NULL (SHA-256 hex)
/// - expires_at: TIMESTAMPTZ NOT NULL
/// - created_at / last_used_at: TIMESTAMPTZ NOT NULL
/// - revoked_at: TIMESTAMPTZ NULL
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,

    pub user_id: i64,

    /// SHA-256 hash of the refresh token (never store raw tokens)
    #[serde(skip_serializing)]
    pub refresh_token_hash: String,

    pub expires_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,

    /// When the refresh token was last rotated
    pub last_used_at: DateTime<Utc>,

    /// When the session was revoked (None if active)
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a new session with a freshly generated id.
    pub fn new(user_id: i64, refresh_token_hash: String, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            refresh_token_hash,
            expires_at,
            created_at: now,
            last_used_at: now,
            revoked_at: None,
        }
    }

    /// Check if the session is currently active (not expired, not revoked).
    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none() && self.expires_at > Utc::now()
    }
}

/// Repository trait for Session data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a new session.
    async fn create(&self, session: &Session) -> Result<Session, AppError>;

    /// Find a non-revoked session by refresh token hash.
    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Session>, AppError>;

    /// Rotate the refresh token of a session.
    async fn update_token_hash(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Revoke one session.
    async fn revoke(&self, id: Uuid) -> Result<(), AppError>;

    /// Revoke every session of a user (after a password reset).
    async fn revoke_all_for_user(&self, user_id: i64) -> Result<u64, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_session_is_active() {
        let session = Session::new(1, "hash".into(), Utc::now() + Duration::days(7));
        assert!(session.is_active());
    }

    #[test]
    fn test_expired_session_is_inactive() {
        let session = Session::new(1, "hash".into(), Utc::now() - Duration::seconds(1));
        assert!(!session.is_active());
    }

    #[test]
    fn test_revoked_session_is_inactive() {
        let mut session = Session::new(1, "hash".into(), Utc::now() + Duration::days(7));
        session.revoked_at = Some(Utc::now());
        assert!(!session.is_active());
    }
}
