//! Google sign-in.
//!
//! ID tokens issued to the mobile/web client are checked against Google's
//! token-info endpoint. A token is accepted only if its audience is our
//! client id and the email is verified.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::config::GoogleSettings;

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("Google rejected the token")]
    InvalidToken,

    #[error("Token audience does not match the configured client id")]
    AudienceMismatch,

    #[error("Google account email is not verified")]
    EmailNotVerified,

    #[error("Google token verification failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Raw token-info response. Google returns most values as strings.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenInfo {
    pub aud: String,
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: Option<serde_json::Value>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Identity extracted from a verified Google ID token.
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleIdentity {
    pub subject: String,
    pub email: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
}

impl TokenInfo {
    /// Validate audience and email verification.
    pub fn into_identity(self, client_id: &str) -> Result<GoogleIdentity, OAuthError> {
        if self.aud != client_id {
            return Err(OAuthError::AudienceMismatch);
        }

        let verified = match &self.email_verified {
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(s)) => s == "true",
            _ => false,
        };
        if !verified {
            return Err(OAuthError::EmailNotVerified);
        }

        Ok(GoogleIdentity {
            subject: self.sub,
            email: self.email,
            given_name: self.given_name,
            family_name: self.family_name,
            picture: self.picture,
        })
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GoogleVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, OAuthError>;
}

pub struct GoogleTokenVerifier {
    http: reqwest::Client,
    tokeninfo_url: String,
    client_id: String,
}

impl GoogleTokenVerifier {
    pub fn new(settings: &GoogleSettings) -> Result<Self, OAuthError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            tokeninfo_url: settings.tokeninfo_url.clone(),
            client_id: settings.client_id.clone(),
        })
    }
}

#[async_trait]
impl GoogleVerifier for GoogleTokenVerifier {
    #[instrument(skip_all)]
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, OAuthError> {
        let response = self
            .http
            .get(&self.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Google token-info rejected the token");
            return Err(OAuthError::InvalidToken);
        }

        let info: TokenInfo = response.json().await?;
        info.into_identity(&self.client_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const CLIENT_ID: &str = "client-id.apps.googleusercontent.com";

    fn token_info(aud: &str, email_verified: serde_json::Value) -> TokenInfo {
        serde_json::from_value(json!({
            "aud": aud,
            "sub": "1098765",
            "email": "eleve@gmail.com",
            "email_verified": email_verified,
            "given_name": "Léa",
            "family_name": "Durand",
            "exp": "1700000000"
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_token_yields_identity() {
        let identity = token_info(CLIENT_ID, json!("true"))
            .into_identity(CLIENT_ID)
            .unwrap();

        assert_eq!(
            identity,
            GoogleIdentity {
                subject: "1098765".into(),
                email: "eleve@gmail.com".into(),
                given_name: Some("Léa".into()),
                family_name: Some("Durand".into()),
                picture: None,
            }
        );
    }

    #[test]
    fn test_boolean_email_verified_is_accepted() {
        assert!(token_info(CLIENT_ID, json!(true)).into_identity(CLIENT_ID).is_ok());
    }

    #[test]
    fn test_wrong_audience_is_rejected() {
        let result = token_info("someone-else", json!("true")).into_identity(CLIENT_ID);
        assert!(matches!(result, Err(OAuthError::AudienceMismatch)));
    }

    #[test]
    fn test_unverified_email_is_rejected() {
        let result = token_info(CLIENT_ID, json!("false")).into_identity(CLIENT_ID);
        assert!(matches!(result, Err(OAuthError::EmailNotVerified)));
    }
}
