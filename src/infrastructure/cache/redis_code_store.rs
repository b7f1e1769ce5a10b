//! Redis-backed code store, shared by every API process.

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{instrument, warn};

use super::code_store::{CodePurpose, CodeStore, PendingCode};
use super::keys;
use crate::shared::error::AppError;

/// Stores each pending code as JSON with a TTL matching its expiry.
#[derive(Clone)]
pub struct RedisCodeStore {
    redis: ConnectionManager,
}

impl RedisCodeStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl CodeStore for RedisCodeStore {
    #[instrument(skip(self, pending))]
    async fn insert(
        &self,
        purpose: CodePurpose,
        email: &str,
        pending: PendingCode,
    ) -> Result<(), AppError> {
        let ttl = (pending.expires_at - Utc::now()).num_seconds();
        let key = keys::verification(purpose, email);
        let mut conn = self.redis.clone();

        if ttl <= 0 {
            conn.del::<_, ()>(&key).await?;
            return Ok(());
        }

        let value = serde_json::to_string(&pending)
            .map_err(|e| AppError::Internal(format!("Serialization error: {}", e)))?;
        conn.set_ex::<_, _, ()>(&key, value, ttl as u64).await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, purpose: CodePurpose, email: &str) -> Result<Option<PendingCode>, AppError> {
        let key = keys::verification(purpose, email);
        let mut conn = self.redis.clone();

        let value: Option<String> = conn.get(&key).await?;
        let Some(value) = value else {
            return Ok(None);
        };

        match serde_json::from_str::<PendingCode>(&value) {
            Ok(pending) if !pending.is_expired() => Ok(Some(pending)),
            Ok(_) => Ok(None),
            Err(e) => {
                warn!(error = %e, key = %key, "Dropping unreadable verification code");
                conn.del::<_, ()>(&key).await?;
                Ok(None)
            }
        }
    }

    #[instrument(skip(self))]
    async fn remove(&self, purpose: CodePurpose, email: &str) -> Result<(), AppError> {
        let mut conn = self.redis.clone();
        conn.del::<_, ()>(keys::verification(purpose, email)).await?;
        Ok(())
    }
}
