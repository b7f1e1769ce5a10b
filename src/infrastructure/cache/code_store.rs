//! Pending verification codes.
//!
//! A code is stored per (purpose, normalized email). Registration codes also
//! carry the account data to create once the code is confirmed, so nothing
//! reaches the `users` table before the email is proven.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::shared::error::AppError;

/// What a verification code unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodePurpose {
    Registration,
    PasswordReset,
}

impl CodePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::PasswordReset => "password_reset",
        }
    }
}

/// Account data held until the registration code is confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRegistration {
    pub password_hash: String,
    pub nom: String,
    pub prenom: String,
    pub sexe: String,
    pub date_naissance: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub registration: Option<PendingRegistration>,
}

impl PendingCode {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Storage for pending codes. Expired entries are never returned.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Store or replace the code for (purpose, email).
    async fn insert(
        &self,
        purpose: CodePurpose,
        email: &str,
        pending: PendingCode,
    ) -> Result<(), AppError>;

    /// Fetch a live code; an expired one is dropped and reported as absent.
    async fn get(&self, purpose: CodePurpose, email: &str) -> Result<Option<PendingCode>, AppError>;

    async fn remove(&self, purpose: CodePurpose, email: &str) -> Result<(), AppError>;
}

/// Process-local store backed by a sharded concurrent map.
#[derive(Debug, Default)]
pub struct InMemoryCodeStore {
    entries: DashMap<(CodePurpose, String), PendingCode>,
}

impl InMemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry.
    pub fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, pending| !pending.is_expired_at(now));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CodeStore for InMemoryCodeStore {
    async fn insert(
        &self,
        purpose: CodePurpose,
        email: &str,
        pending: PendingCode,
    ) -> Result<(), AppError> {
        let swept = self.sweep_expired();
        if swept > 0 {
            debug!(swept, "Dropped expired verification codes");
        }
        self.entries.insert((purpose, email.to_string()), pending);
        Ok(())
    }

    async fn get(&self, purpose: CodePurpose, email: &str) -> Result<Option<PendingCode>, AppError> {
        let key = (purpose, email.to_string());
        let pending = self.entries.get(&key).map(|entry| entry.value().clone());

        match pending {
            Some(pending) if pending.is_expired() => {
                // Guard against a concurrent insert replacing the entry meanwhile
                self.entries.remove_if(&key, |_, current| current.is_expired());
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn remove(&self, purpose: CodePurpose, email: &str) -> Result<(), AppError> {
        self.entries.remove(&(purpose, email.to_string()));
        Ok(())
    }
}
