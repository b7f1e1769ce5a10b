//! User entity and repository trait.
//!
//! Maps to the `users` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::profile::{Location, LocationPatch, Moyenne, MoyennePatch};
use crate::shared::error::AppError;

/// How the account authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    #[default]
    Local,
    Google,
}

impl AuthProvider {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "google" => Self::Google,
            _ => Self::Local,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Google => "google",
        }
    }
}

impl std::fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A student account and its profile columns.
///
/// Maps to the `users` table:
/// - id: BIGSERIAL PRIMARY KEY
/// - email: VARCHAR(254) NOT NULL UNIQUE
/// - password_hash: VARCHAR(256) NULL (social accounts have none)
/// - nom / prenom: VARCHAR(200) NOT NULL
/// - specialites / filiere: TEXT[] NULL
/// - plan_action_id: BIGINT NULL REFERENCES plan_actions(id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Normalized (lower-case) email address
    pub email: String,

    /// Argon2 password hash
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    pub auth_provider: AuthProvider,

    pub nom: String,
    pub prenom: String,
    pub sexe: Option<String>,
    pub date_naissance: Option<NaiveDate>,
    pub profile_picture: Option<String>,
    pub objectif: Option<String>,
    pub niveau_scolaire: Option<String>,
    pub voie: Option<String>,
    pub specialites: Option<Vec<String>>,
    pub filiere: Option<Vec<String>>,
    pub telephone: Option<String>,
    pub budget: Option<String>,
    pub est_boursier: bool,

    /// Action plan assigned at account creation
    pub plan_action_id: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for User {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            email: String::new(),
            password_hash: None,
            auth_provider: AuthProvider::default(),
            nom: String::new(),
            prenom: String::new(),
            sexe: None,
            date_naissance: None,
            profile_picture: None,
            objectif: None,
            niveau_scolaire: None,
            voie: None,
            specialites: None,
            filiere: None,
            telephone: None,
            budget: None,
            est_boursier: false,
            plan_action_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Data required to insert a new account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub auth_provider: AuthProvider,
    pub nom: String,
    pub prenom: String,
    pub sexe: Option<String>,
    pub date_naissance: Option<NaiveDate>,
    pub profile_picture: Option<String>,
}

/// Partial update of the profile columns.
///
/// `None` leaves a column untouched; `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub nom: Option<String>,
    pub prenom: Option<String>,
    pub sexe: Option<Option<String>>,
    pub date_naissance: Option<Option<NaiveDate>>,
    pub profile_picture: Option<Option<String>>,
    pub objectif: Option<Option<String>>,
    pub niveau_scolaire: Option<Option<String>>,
    pub voie: Option<Option<String>>,
    pub specialites: Option<Option<Vec<String>>>,
    pub filiere: Option<Option<Vec<String>>>,
    pub telephone: Option<Option<String>>,
    pub budget: Option<Option<String>>,
    pub est_boursier: Option<bool>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A user together with the rows hanging off it.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub user: User,
    pub moyenne: Option<Moyenne>,
    pub location: Option<Location>,
    /// Titles of the steps of the assigned plan, in order
    pub plan_steps: Vec<String>,
}

/// Repository trait for User data access operations.
///
/// The trait is defined in the domain layer to maintain dependency inversion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by id.
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Find a user by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Load a user with grades, location and plan step titles.
    async fn find_profile(&self, id: i64) -> Result<Option<UserProfile>, AppError>;

    /// Check if an email address is already registered.
    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;

    /// Insert a new account. A duplicate email yields `AppError::Conflict`.
    async fn create(&self, user: &NewUser) -> Result<User, AppError>;

    /// Write only the columns present in the patches, in one transaction.
    /// An unknown id yields `AppError::NotFound`.
    async fn update_profile(
        &self,
        id: i64,
        user: &UserPatch,
        moyenne: &MoyennePatch,
        location: &LocationPatch,
    ) -> Result<(), AppError>;

    /// Replace the password hash.
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError>;

    /// Delete an account and everything it owns.
    async fn delete(&self, id: i64) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_provider_from_str() {
        assert_eq!(AuthProvider::from_str("google"), AuthProvider::Google);
        assert_eq!(AuthProvider::from_str("GOOGLE"), AuthProvider::Google);
        assert_eq!(AuthProvider::from_str("local"), AuthProvider::Local);
        assert_eq!(AuthProvider::from_str("anything"), AuthProvider::Local);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            email: "eleve@example.com".into(),
            password_hash: Some("$argon2id$secret".into()),
            ..User::default()
        };

        let serialized = serde_json::to_string(&user).expect("Failed to serialize user");

        assert!(!serialized.contains("password_hash"));
        assert!(!serialized.contains("argon2id"));
        assert!(serialized.contains("\"auth_provider\":\"local\""));
    }
}
