//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Database configuration (PostgreSQL)
    pub database: DatabaseSettings,

    /// Redis configuration (only used by the redis code store)
    #[serde(default)]
    pub redis: RedisSettings,

    /// JWT authentication settings
    pub jwt: JwtSettings,

    /// Verification code settings (registration and password reset)
    pub registration: RegistrationSettings,

    /// Outbound SMTP settings
    pub email: EmailSettings,

    /// Google social login settings
    pub google: GoogleSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,

    /// Apply pending migrations on startup
    pub run_migrations: bool,
}

/// Redis configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedisSettings {
    /// Redis connection URL
    pub url: Option<String>,
}

/// JWT authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens
    pub secret: String,

    /// Access token expiry in minutes
    pub access_token_expiry_minutes: i64,

    /// Refresh token expiry in days
    pub refresh_token_expiry_days: i64,
}

/// Backend used to keep pending verification codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeStoreBackend {
    Memory,
    Redis,
}

/// Verification code configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationSettings {
    /// Number of digits in a verification code
    pub code_length: usize,

    /// Lifetime of a registration code in seconds
    pub code_expiry_seconds: i64,

    /// Lifetime of a password reset code in seconds
    pub reset_code_expiry_seconds: i64,

    /// Where pending codes are kept
    pub store: CodeStoreBackend,
}

/// SMTP configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    /// When false, codes are logged instead of sent
    pub enabled: bool,

    pub host: String,

    pub port: u16,

    /// Implicit TLS (SMTPS) instead of STARTTLS
    pub use_ssl: bool,

    /// SMTP login
    pub sender: String,

    pub password: String,

    /// Address used in the From header
    pub default_sender: String,

    /// SMTP timeout in seconds
    pub timeout_seconds: u64,
}

/// Google identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleSettings {
    /// OAuth client id, expected as the `aud` of ID tokens
    pub client_id: String,

    pub client_secret: String,

    /// Token verification endpoint
    pub tokeninfo_url: String,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env)
    pub allowed_origins: Vec<String>,
}

/// Minimum required length for JWT secret (256 bits = 32 bytes)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// if the JWT secret is too short, or if the redis store is selected
    /// without a redis URL.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("database.run_migrations", true)?
            .set_default("jwt.access_token_expiry_minutes", 60)?
            .set_default("jwt.refresh_token_expiry_days", 7)?
            .set_default("registration.code_length", 6)?
            .set_default("registration.code_expiry_seconds", 1800)?
            .set_default("registration.reset_code_expiry_seconds", 1800)?
            .set_default("registration.store", "memory")?
            .set_default("email.enabled", false)?
            .set_default("email.host", "localhost")?
            .set_default("email.port", 587)?
            .set_default("email.use_ssl", false)?
            .set_default("email.sender", "")?
            .set_default("email.password", "")?
            .set_default("email.default_sender", "no-reply@localhost")?
            .set_default("email.timeout_seconds", 10)?
            .set_default("google.client_id", "")?
            .set_default("google.client_secret", "")?
            .set_default(
                "google.tokeninfo_url",
                "https://oauth2.googleapis.com/tokeninfo",
            )?
            .set_default("cors.allowed_origins", vec!["http://localhost:3000"])?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SERVER__PORT=8000 -> server.port = 8000
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("redis.url", std::env::var("REDIS_URL").ok())?
            .set_override_option("jwt.secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option("email.host", std::env::var("EMAIL_HOST").ok())?
            .set_override_option("email.port", std::env::var("EMAIL_PORT").ok())?
            .set_override_option("email.use_ssl", std::env::var("EMAIL_USE_SSL").ok())?
            .set_override_option("email.sender", std::env::var("EMAIL_SENDER").ok())?
            .set_override_option("email.password", std::env::var("EMAIL_PASSWORD").ok())?
            .set_override_option(
                "email.default_sender",
                std::env::var("EMAIL_DEFAULT_SENDER").ok(),
            )?
            .set_override_option("google.client_id", std::env::var("GOOGLE_CLIENT_ID").ok())?
            .set_override_option(
                "google.client_secret",
                std::env::var("GOOGLE_CLIENT_SECRET").ok(),
            )?
            .set_override_option(
                "registration.code_expiry_seconds",
                std::env::var("REGISTRATION_CODE_EXPIRES").ok(),
            )?
            .set_override_option(
                "registration.reset_code_expiry_seconds",
                std::env::var("RESET_CODE_EXPIRES").ok(),
            )?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| settings.validate())
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.jwt.secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::Message(format!(
                "JWT secret must be at least {} characters for security. Current length: {}",
                MIN_JWT_SECRET_LENGTH,
                self.jwt.secret.len()
            )));
        }
        if self.registration.store == CodeStoreBackend::Redis && self.redis.url.is_none() {
            return Err(ConfigError::Message(
                "registration.store = \"redis\" requires REDIS_URL".into(),
            ));
        }
        if self.registration.code_length == 0 {
            return Err(ConfigError::Message(
                "registration.code_length must be positive".into(),
            ));
        }
        Ok(self)
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
pub fn test_settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseSettings {
            url: "postgres://localhost/orientation_test".into(),
            max_connections: 1,
            min_connections: 0,
            acquire_timeout: 1,
            run_migrations: false,
        },
        redis: RedisSettings::default(),
        jwt: JwtSettings {
            secret: "test-secret-that-is-long-enough-for-hs256".into(),
            access_token_expiry_minutes: 60,
            refresh_token_expiry_days: 7,
        },
        registration: RegistrationSettings {
            code_length: 6,
            code_expiry_seconds: 1800,
            reset_code_expiry_seconds: 1800,
            store: CodeStoreBackend::Memory,
        },
        email: EmailSettings {
            enabled: false,
            host: "localhost".into(),
            port: 587,
            use_ssl: false,
            sender: String::new(),
            password: String::new(),
            default_sender: "no-reply@localhost".into(),
            timeout_seconds: 10,
        },
        google: GoogleSettings {
            client_id: "client-id.apps.googleusercontent.com".into(),
            client_secret: String::new(),
            tokeninfo_url: "https://oauth2.googleapis.com/tokeninfo".into(),
        },
        cors: CorsSettings {
            allowed_origins: vec![],
        },
        environment: "test".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_jwt_secret_is_rejected() {
        let mut settings = test_settings();
        settings.jwt.secret = "short".into();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_redis_store_requires_url() {
        let mut settings = test_settings();
        settings.registration.store = CodeStoreBackend::Redis;
        assert!(settings.clone().validate().is_err());

        settings.redis.url = Some("redis://localhost:6379".into());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_server_addr() {
        let settings = test_settings();
        assert_eq!(settings.server_addr(), "127.0.0.1:0");
    }
}
