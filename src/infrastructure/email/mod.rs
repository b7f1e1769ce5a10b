//! Outgoing email.
//!
//! Verification and reset codes are sent as HTML rendered from the templates
//! in `templates/`. `SmtpMailer` talks to a real relay; `LogMailer` only logs
//! the code and is used when email is disabled (local development).

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, instrument, warn};

use crate::config::EmailSettings;

const REGISTRATION_TEMPLATE: &str = include_str!("../../../templates/registration_verification.html");
const RESET_TEMPLATE: &str = include_str!("../../../templates/mail.html");

pub const REGISTRATION_SUBJECT: &str = "Code de vérification d'inscription";
pub const RESET_SUBJECT: &str = "Code de réinitialisation de mot de passe";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP error: {0}")]
    Transport(String),
}

/// Sends verification codes to users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_registration_code(&self, to: &str, code: &str) -> Result<(), MailError>;

    async fn send_reset_code(&self, to: &str, code: &str) -> Result<(), MailError>;
}

/// Substitute `{{ verification_code }}` and `{{ email }}` in a template.
pub fn render_template(template: &str, code: &str, email: &str) -> String {
    template
        .replace("{{ verification_code }}", code)
        .replace("{{ email }}", email)
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build the SMTP transport. Implicit TLS when `use_ssl`, STARTTLS otherwise.
    pub fn new(settings: &EmailSettings) -> Result<Self, MailError> {
        let builder = if settings.use_ssl {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
        }
        .map_err(|e| MailError::Transport(e.to_string()))?;

        let transport = builder
            .port(settings.port)
            .credentials(Credentials::new(
                settings.sender.clone(),
                settings.password.clone(),
            ))
            .timeout(Some(Duration::from_secs(settings.timeout_seconds)))
            .build();

        let from = settings
            .default_sender
            .parse::<Mailbox>()
            .map_err(|e| MailError::InvalidAddress(format!("{}: {}", settings.default_sender, e)))?;

        Ok(Self { transport, from })
    }

    #[instrument(skip(self, html), fields(to = %to))]
    async fn send_html(&self, to: &str, subject: &str, html: String) -> Result<(), MailError> {
        let recipient = to
            .parse::<Mailbox>()
            .map_err(|e| MailError::InvalidAddress(format!("{}: {}", to, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport.send(message).await.map_err(|e| {
            warn!(error = %e, "SMTP delivery failed");
            MailError::Transport(e.to_string())
        })?;

        info!("Email sent");
        Ok(())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_registration_code(&self, to: &str, code: &str) -> Result<(), MailError> {
        let html = render_template(REGISTRATION_TEMPLATE, code, to);
        self.send_html(to, REGISTRATION_SUBJECT, html).await
    }

    async fn send_reset_code(&self, to: &str, code: &str) -> Result<(), MailError> {
        let html = render_template(RESET_TEMPLATE, code, to);
        self.send_html(to, RESET_SUBJECT, html).await
    }
}

/// Logs codes instead of sending them.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_registration_code(&self, to: &str, code: &str) -> Result<(), MailError> {
        info!(to = %to, code = %code, "Email disabled, registration code not sent");
        Ok(())
    }

    async fn send_reset_code(&self, to: &str, code: &str) -> Result<(), MailError> {
        info!(to = %to, code = %code, "Email disabled, reset code not sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_registration_template() {
        let html = render_template(REGISTRATION_TEMPLATE, "482913", "eleve@example.com");

        assert!(html.contains("482913"));
        assert!(html.contains("eleve@example.com"));
        assert!(!html.contains("{{ verification_code }}"));
        assert!(!html.contains("{{ email }}"));
    }

    #[test]
    fn test_render_reset_template() {
        let html = render_template(RESET_TEMPLATE, "000111", "eleve@example.com");
        assert!(html.contains("000111"));
        assert!(!html.contains("{{"));
    }

    #[tokio::test]
    async fn test_smtp_mailer_rejects_bad_sender() {
        let mut settings = crate::config::test_settings().email;
        settings.default_sender = "not an address".into();

        assert!(matches!(
            SmtpMailer::new(&settings),
            Err(MailError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn test_log_mailer_always_succeeds() {
        let mailer = LogMailer;
        assert!(mailer.send_registration_code("a@b.fr", "123456").await.is_ok());
        assert!(mailer.send_reset_code("a@b.fr", "123456").await.is_ok());
    }
}
