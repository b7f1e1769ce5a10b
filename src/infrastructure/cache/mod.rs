//! Cache Module
//!
//! Short-lived state kept outside PostgreSQL: pending registrations and
//! password reset codes.
//!
//! # Architecture
//!
//! ```text
//! +-------------------+
//! |   AuthService     |
//! +-------------------+
//!          |
//!          v
//! +-------------------+
//! |  CodeStore trait  |  <-- Abstract interface
//! +-------------------+
//!      |         |
//!      v         v
//! +---------+ +----------------+
//! | DashMap | | RedisCodeStore |  <-- ConnectionManager
//! +---------+ +----------------+
//! ```

mod code_store;
mod redis_code_store;

pub use code_store::{CodePurpose, CodeStore, InMemoryCodeStore, PendingCode, PendingRegistration};
pub use redis_code_store::RedisCodeStore;

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

/// Creates a Redis connection manager with automatic reconnection.
#[instrument(skip(url))]
pub async fn create_redis_client(url: &str) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(url)?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}

/// Cache key prefixes.
pub mod keys {
    use super::CodePurpose;

    /// Prefix for pending verification codes (e.g., "verify:registration:a@b.fr")
    pub const VERIFY: &str = "verify:";

    /// Generates the key of a pending code
    #[inline]
    pub fn verification(purpose: CodePurpose, email: &str) -> String {
        format!("{}{}:{}", VERIFY, purpose.as_str(), email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_key() {
        assert_eq!(
            keys::verification(CodePurpose::Registration, "eleve@example.com"),
            "verify:registration:eleve@example.com"
        );
        assert_eq!(
            keys::verification(CodePurpose::PasswordReset, "eleve@example.com"),
            "verify:password_reset:eleve@example.com"
        );
    }
}
