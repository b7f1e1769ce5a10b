//! Authentication Service
//!
//! Handles email verified registration, password and Google login, JWT token
//! management with rotating refresh tokens, and password reset codes.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use super::plan_service::{bootstrap_plan, PlanError};
use crate::application::dto::request::RegisterRequest;
use crate::config::{JwtSettings, RegistrationSettings};
use crate::domain::{
    AuthProvider, NewUser, PlanRepository, Session, SessionRepository, UserProfile,
    UserRepository,
};
use crate::infrastructure::cache::{CodePurpose, CodeStore, PendingCode, PendingRegistration};
use crate::infrastructure::email::{MailError, Mailer};
use crate::infrastructure::metrics;
use crate::infrastructure::oauth::{GoogleIdentity, GoogleVerifier, OAuthError};
use crate::shared::code::generate_code;
use crate::shared::error::AppError;
use crate::shared::validation::normalize_email;

/// Authentication service trait for dependency injection
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Hold the registration and email a verification code
    async fn register(&self, request: RegisterRequest) -> Result<(), AuthError>;

    /// Issue a fresh code for a pending registration
    async fn resend_registration_code(&self, email: &str) -> Result<(), AuthError>;

    /// Confirm the code, create the account and open a session
    async fn verify_registration(
        &self,
        email: &str,
        code: &str,
    ) -> Result<(UserProfile, AuthTokens), AuthError>;

    /// Authenticate user with credentials
    async fn login(&self, email: &str, password: &str)
        -> Result<(UserProfile, AuthTokens), AuthError>;

    /// Refresh access token using refresh token
    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokens, AuthError>;

    /// Revoke refresh token (logout)
    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError>;

    /// Sign in (or sign up) with a Google ID token
    async fn google_login(&self, id_token: &str) -> Result<(UserProfile, AuthTokens), AuthError>;

    async fn forgot_password(&self, email: &str) -> Result<(), AuthError>;

    /// Check a reset code without consuming it
    async fn verify_reset_code(&self, email: &str, code: &str) -> Result<(), AuthError>;

    async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;
}

/// Authentication tokens response
#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
    /// JWT ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub.parse::<i64>().map_err(|_| AuthError::InvalidToken)
    }
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already exists")]
    EmailExists,

    #[error("Email not found")]
    EmailNotFound,

    #[error("Verification code could not be delivered")]
    UndeliverableEmail,

    #[error("No pending registration")]
    NoPendingRegistration,

    #[error("Code missing or expired")]
    CodeExpired,

    #[error("Wrong code")]
    InvalidCode,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Session not found or revoked")]
    SessionNotFound,

    #[error("Google sign-in failed: {0}")]
    Google(#[from] OAuthError),

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Repository(#[from] AppError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                AppError::Unauthorized("Email ou mot de passe incorrect".into())
            }
            AuthError::EmailExists => AppError::Conflict("Email déjà utilisé".into()),
            AuthError::EmailNotFound => AppError::NotFound("Email non trouvé".into()),
            AuthError::UndeliverableEmail => AppError::BadRequest(
                "Adresse email invalide. Veuillez fournir une adresse email correcte".into(),
            ),
            AuthError::NoPendingRegistration => {
                AppError::NotFound("Aucune inscription en attente pour cet email".into())
            }
            AuthError::CodeExpired => AppError::Unauthorized("Code invalide ou expiré".into()),
            AuthError::InvalidCode => AppError::Unauthorized("Code invalide".into()),
            AuthError::TokenExpired => AppError::Unauthorized("Token expiré".into()),
            AuthError::InvalidToken => AppError::Unauthorized("Token invalide".into()),
            AuthError::SessionNotFound => {
                AppError::Unauthorized("Session invalide ou expirée".into())
            }
            AuthError::Google(OAuthError::Http(e)) => {
                AppError::Internal(format!("Google token verification failed: {}", e))
            }
            AuthError::Google(OAuthError::EmailNotVerified) => {
                AppError::Unauthorized("Email Google non vérifié".into())
            }
            AuthError::Google(_) => AppError::Unauthorized("Token Google invalide".into()),
            AuthError::Mail(e) => AppError::Email(e.to_string()),
            AuthError::Plan(e) => e.into(),
            AuthError::Repository(e) => e,
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Hash a password using Argon2id
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Hash refresh token for storage
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Decode and validate an access token
pub fn decode_access_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Generate access and refresh tokens
pub fn generate_tokens(user_id: i64, settings: &JwtSettings) -> Result<AuthTokens, AuthError> {
    let now = Utc::now();
    let access_expiry = now + Duration::minutes(settings.access_token_expiry_minutes);

    let access_claims = Claims {
        sub: user_id.to_string(),
        exp: access_expiry.timestamp(),
        iat: now.timestamp(),
        jti: Some(uuid::Uuid::new_v4().to_string()),
    };

    let access_token = encode(
        &Header::default(),
        &access_claims,
        &EncodingKey::from_secret(settings.secret.as_bytes()),
    )
    .map_err(|e| AuthError::Internal(format!("Token generation failed: {}", e)))?;

    // Opaque refresh token, only its hash is persisted
    let refresh_token = format!("{}.{}", uuid::Uuid::new_v4(), uuid::Uuid::new_v4());

    Ok(AuthTokens {
        access_token,
        refresh_token,
        expires_in: settings.access_token_expiry_minutes * 60,
        token_type: "Bearer".to_string(),
    })
}

/// Process-wide collaborators of the auth service.
#[derive(Clone)]
pub struct AuthDeps {
    pub codes: Arc<dyn CodeStore>,
    pub mailer: Arc<dyn Mailer>,
    pub google: Arc<dyn GoogleVerifier>,
}

/// AuthService implementation
pub struct AuthServiceImpl<U, S, P>
where
    U: UserRepository,
    S: SessionRepository,
    P: PlanRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    plan_repo: Arc<P>,
    deps: AuthDeps,
    jwt_settings: JwtSettings,
    registration: RegistrationSettings,
}

impl<U, S, P> AuthServiceImpl<U, S, P>
where
    U: UserRepository,
    S: SessionRepository,
    P: PlanRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        session_repo: Arc<S>,
        plan_repo: Arc<P>,
        deps: AuthDeps,
        jwt_settings: JwtSettings,
        registration: RegistrationSettings,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            plan_repo,
            deps,
            jwt_settings,
            registration,
        }
    }

    fn refresh_expiry(&self) -> chrono::DateTime<Utc> {
        Utc::now() + Duration::days(self.jwt_settings.refresh_token_expiry_days)
    }

    /// Issue tokens and persist a session for the refresh token
    async fn open_session(&self, user_id: i64) -> Result<AuthTokens, AuthError> {
        let tokens = generate_tokens(user_id, &self.jwt_settings)?;
        let session = Session::new(
            user_id,
            hash_refresh_token(&tokens.refresh_token),
            self.refresh_expiry(),
        );
        self.session_repo.create(&session).await?;
        Ok(tokens)
    }

    async fn load_profile(&self, user_id: i64) -> Result<UserProfile, AuthError> {
        self.user_repo
            .find_profile(user_id)
            .await?
            .ok_or_else(|| AuthError::Internal(format!("User {} vanished", user_id)))
    }

    fn new_pending(&self, expiry_seconds: i64, registration: Option<PendingRegistration>) -> PendingCode {
        PendingCode {
            code: generate_code(self.registration.code_length),
            expires_at: Utc::now() + Duration::seconds(expiry_seconds),
            registration,
        }
    }

    /// Store a registration code and email it; the entry is dropped if sending fails
    async fn send_registration_code(&self, email: &str, pending: PendingCode) -> Result<(), AuthError> {
        let code = pending.code.clone();
        self.deps
            .codes
            .insert(CodePurpose::Registration, email, pending)
            .await?;

        if let Err(e) = self.deps.mailer.send_registration_code(email, &code).await {
            warn!(error = %e, "Registration code could not be sent");
            self.deps.codes.remove(CodePurpose::Registration, email).await?;
            metrics::record_verification_code(CodePurpose::Registration.as_str(), "send_failed");
            return Err(AuthError::UndeliverableEmail);
        }

        metrics::record_verification_code(CodePurpose::Registration.as_str(), "sent");
        Ok(())
    }

    /// Fetch a live code and compare it
    async fn check_code(
        &self,
        purpose: CodePurpose,
        email: &str,
        code: &str,
        wrong_code: AuthError,
    ) -> Result<PendingCode, AuthError> {
        let pending = match self.deps.codes.get(purpose, email).await? {
            Some(pending) => pending,
            None => {
                metrics::record_verification_code(purpose.as_str(), "expired");
                return Err(AuthError::CodeExpired);
            }
        };

        if pending.code != code.trim() {
            metrics::record_verification_code(purpose.as_str(), "invalid");
            return Err(wrong_code);
        }

        Ok(pending)
    }

    /// Existing account for the Google email, or a new one with a bootstrapped plan
    async fn find_or_create_google_user(&self, identity: GoogleIdentity) -> Result<i64, AuthError> {
        let email = normalize_email(&identity.email);
        if let Some(user) = self.user_repo.find_by_email(&email).await? {
            return Ok(user.id);
        }

        let new_user = NewUser {
            email,
            password_hash: None,
            auth_provider: AuthProvider::Google,
            nom: identity.family_name.unwrap_or_default(),
            prenom: identity.given_name.unwrap_or_default(),
            sexe: None,
            date_naissance: None,
            profile_picture: identity.picture,
        };

        let user = self.user_repo.create(&new_user).await?;
        bootstrap_plan(self.plan_repo.as_ref(), user.id).await?;
        info!(user_id = user.id, "Account created from Google sign-in");
        Ok(user.id)
    }
}

#[async_trait]
impl<U, S, P> AuthService for AuthServiceImpl<U, S, P>
where
    U: UserRepository + 'static,
    S: SessionRepository + 'static,
    P: PlanRepository + 'static,
{
    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn register(&self, request: RegisterRequest) -> Result<(), AuthError> {
        let email = normalize_email(&request.email);

        if self.user_repo.email_exists(&email).await? {
            return Err(AuthError::EmailExists);
        }

        let registration = PendingRegistration {
            password_hash: hash_password(&request.password)?,
            nom: request.nom.trim().to_string(),
            prenom: request.prenom.trim().to_string(),
            sexe: request.sexe,
            date_naissance: request.date_naissance,
        };

        let pending = self.new_pending(self.registration.code_expiry_seconds, Some(registration));
        self.send_registration_code(&email, pending).await
    }

    #[instrument(skip(self))]
    async fn resend_registration_code(&self, email: &str) -> Result<(), AuthError> {
        let email = normalize_email(email);

        let registration = self
            .deps
            .codes
            .get(CodePurpose::Registration, &email)
            .await?
            .and_then(|pending| pending.registration)
            .ok_or(AuthError::NoPendingRegistration)?;

        let pending = self.new_pending(self.registration.code_expiry_seconds, Some(registration));
        self.send_registration_code(&email, pending).await
    }

    #[instrument(skip(self, code))]
    async fn verify_registration(
        &self,
        email: &str,
        code: &str,
    ) -> Result<(UserProfile, AuthTokens), AuthError> {
        let email = normalize_email(email);

        let pending = self
            .check_code(CodePurpose::Registration, &email, code, AuthError::InvalidCode)
            .await?;
        let registration = pending.registration.ok_or(AuthError::CodeExpired)?;

        if self.user_repo.email_exists(&email).await? {
            self.deps.codes.remove(CodePurpose::Registration, &email).await?;
            return Err(AuthError::EmailExists);
        }

        let new_user = NewUser {
            email: email.clone(),
            password_hash: Some(registration.password_hash),
            auth_provider: AuthProvider::Local,
            nom: registration.nom,
            prenom: registration.prenom,
            sexe: Some(registration.sexe),
            date_naissance: Some(registration.date_naissance),
            profile_picture: None,
        };

        let user = self.user_repo.create(&new_user).await.map_err(|e| match e {
            AppError::Conflict(_) => AuthError::EmailExists,
            e => AuthError::Repository(e),
        })?;
        self.deps.codes.remove(CodePurpose::Registration, &email).await?;
        metrics::record_verification_code(CodePurpose::Registration.as_str(), "verified");

        bootstrap_plan(self.plan_repo.as_ref(), user.id).await?;
        let tokens = self.open_session(user.id).await?;
        let profile = self.load_profile(user.id).await?;

        info!(user_id = user.id, "Account created");
        Ok((profile, tokens))
    }

    #[instrument(skip(self, password))]
    async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(UserProfile, AuthTokens), AuthError> {
        let email = normalize_email(email);

        let user = match self.user_repo.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                metrics::record_login("password", false);
                return Err(AuthError::InvalidCredentials);
            }
        };

        // Social-only accounts have no password to check
        let valid = match user.password_hash.as_deref() {
            Some(hash) => verify_password(password, hash)?,
            None => false,
        };
        metrics::record_login("password", valid);
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.open_session(user.id).await?;
        let profile = self.load_profile(user.id).await?;
        Ok((profile, tokens))
    }

    #[instrument(skip_all)]
    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        let token_hash = hash_refresh_token(refresh_token);

        let session = self
            .session_repo
            .find_by_token_hash(&token_hash)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if !session.is_active() {
            return Err(AuthError::TokenExpired);
        }

        // Rotate: the presented refresh token stops working
        let new_tokens = generate_tokens(session.user_id, &self.jwt_settings)?;
        let new_token_hash = hash_refresh_token(&new_tokens.refresh_token);

        self.session_repo
            .update_token_hash(session.id, &new_token_hash, self.refresh_expiry())
            .await?;

        Ok(new_tokens)
    }

    #[instrument(skip_all)]
    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let token_hash = hash_refresh_token(refresh_token);

        match self.session_repo.find_by_token_hash(&token_hash).await {
            Ok(Some(session)) => {
                if let Err(e) = self.session_repo.revoke(session.id).await {
                    warn!(error = %e, "Failed to revoke session on logout");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to look up session on logout"),
        }

        Ok(())
    }

    #[instrument(skip_all)]
    async fn google_login(&self, id_token: &str) -> Result<(UserProfile, AuthTokens), AuthError> {
        let identity = match self.deps.google.verify(id_token).await {
            Ok(identity) => identity,
            Err(e) => {
                metrics::record_login("google", false);
                return Err(e.into());
            }
        };

        let user_id = self.find_or_create_google_user(identity).await?;
        metrics::record_login("google", true);

        let tokens = self.open_session(user_id).await?;
        let profile = self.load_profile(user_id).await?;
        Ok((profile, tokens))
    }

    #[instrument(skip(self))]
    async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let email = normalize_email(email);

        if !self.user_repo.email_exists(&email).await? {
            return Err(AuthError::EmailNotFound);
        }

        let pending = self.new_pending(self.registration.reset_code_expiry_seconds, None);
        let code = pending.code.clone();
        self.deps
            .codes
            .insert(CodePurpose::PasswordReset, &email, pending)
            .await?;

        if let Err(e) = self.deps.mailer.send_reset_code(&email, &code).await {
            self.deps.codes.remove(CodePurpose::PasswordReset, &email).await?;
            metrics::record_verification_code(CodePurpose::PasswordReset.as_str(), "send_failed");
            return Err(e.into());
        }

        metrics::record_verification_code(CodePurpose::PasswordReset.as_str(), "sent");
        Ok(())
    }

    #[instrument(skip(self, code))]
    async fn verify_reset_code(&self, email: &str, code: &str) -> Result<(), AuthError> {
        let email = normalize_email(email);
        self.check_code(CodePurpose::PasswordReset, &email, code, AuthError::CodeExpired)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, code, new_password))]
    async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let email = normalize_email(email);
        self.check_code(CodePurpose::PasswordReset, &email, code, AuthError::CodeExpired)
            .await?;

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::EmailNotFound)?;

        let password_hash = hash_password(new_password)?;
        self.user_repo.update_password(user.id, &password_hash).await?;
        self.deps.codes.remove(CodePurpose::PasswordReset, &email).await?;
        metrics::record_verification_code(CodePurpose::PasswordReset.as_str(), "verified");

        let revoked = self.session_repo.revoke_all_for_user(user.id).await?;
        info!(user_id = user.id, revoked, "Password reset");
        Ok(())
    }
}
