//! SMTP mailer using lettre.

use super::{Email, Mailer};
use crate::error::{LockgateError, Result};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};

/// SMTP configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP server hostname
    pub host: String,
    /// SMTP server port (default: 587 for STARTTLS)
    pub port: u16,
    /// Username for authentication
    pub username: Option<String>,
    /// Password for authentication
    pub password: Option<String>,
    /// Use STARTTLS (default: true)
    pub starttls: bool,
}

impl SmtpConfig {
    /// Create a new SMTP configuration with the server hostname.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 587,
            username: None,
            password: None,
            starttls: true,
        }
    }

    /// Set the port (default: 587).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set authentication credentials.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Disable STARTTLS (plain connection).
    pub fn no_starttls(mut self) -> Self {
        self.starttls = false;
        self
    }

    /// Create config from environment variables.
    ///
    /// Reads from:
    /// - `EMAIL_HOST` (required)
    /// - `EMAIL_PORT` (optional, default: 587)
    /// - `EMAIL_USER` (optional)
    /// - `EMAIL_PASS` (optional)
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("EMAIL_HOST")
            .map_err(|_| LockgateError::internal("EMAIL_HOST environment variable not set"))?;

        let port = std::env::var("EMAIL_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(587);

        let username = std::env::var("EMAIL_USER").ok();
        let password = std::env::var("EMAIL_PASS").ok();

        Ok(Self {
            host,
            port,
            username,
            password,
            starttls: true,
        })
    }
}

/// SMTP mailer using lettre.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: SmtpConfig,
}

impl SmtpMailer {
    /// Create a new SMTP mailer with the given configuration.
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let mut builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host).map_err(|e| {
                LockgateError::internal(format!("Failed to create SMTP transport: {}", e))
            })?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        builder = builder.port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            let credentials = Credentials::new(username.clone(), password.clone());
            builder = builder.credentials(credentials);
        }

        Ok(Self {
            transport: builder.build(),
            config,
        })
    }

    /// Create a new SMTP mailer from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(SmtpConfig::from_env()?)
    }

    fn build_message(&self, email: &Email) -> Result<Message> {
        let from: Mailbox = email
            .from
            .parse()
            .map_err(|e| LockgateError::internal(format!("Invalid 'from' address: {}", e)))?;
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| LockgateError::internal(format!("Invalid 'to' address: {}", e)))?;

        let builder = Message::builder().from(from).to(to).subject(&email.subject);

        let message = match (&email.text, &email.html) {
            (Some(text), Some(html)) => builder
                .multipart(
                    MultiPart::alternative()
                        .singlepart(
                            SinglePart::builder()
                                .header(ContentType::TEXT_PLAIN)
                                .body(text.clone()),
                        )
                        .singlepart(
                            SinglePart::builder()
                                .header(ContentType::TEXT_HTML)
                                .body(html.clone()),
                        ),
                )
                .map_err(|e| LockgateError::internal(format!("Failed to build email: {}", e)))?,
            (Some(text), None) => builder
                .header(ContentType::TEXT_PLAIN)
                .body(text.clone())
                .map_err(|e| LockgateError::internal(format!("Failed to build email: {}", e)))?,
            (None, Some(html)) => builder
                .header(ContentType::TEXT_HTML)
                .body(html.clone())
                .map_err(|e| LockgateError::internal(format!("Failed to build email: {}", e)))?,
            (None, None) => {
                return Err(LockgateError::internal(
                    "Email must have either text or HTML body",
                ));
            }
        };

        Ok(message)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        email.validate()?;

        let message = self.build_message(email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| LockgateError::unavailable(format!("Failed to send email: {}", e)))?;

        Ok(())
    }

    fn is_healthy(&self) -> bool {
        // Connection state is not cached; report configured-and-ready
        true
    }
}

// AsyncSmtpTransport doesn't impl Debug
impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SmtpConfig::new("smtp.example.com");
        assert_eq!(config.port, 587);
        assert!(config.starttls);
        assert!(config.username.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = SmtpConfig::new("smtp.example.com")
            .port(2525)
            .credentials("user", "pass")
            .no_starttls();
        assert_eq!(config.port, 2525);
        assert_eq!(config.username.as_deref(), Some("user"));
        assert!(!config.starttls);
    }

    #[tokio::test]
    async fn test_build_message_rejects_bad_addresses() {
        let mailer = SmtpMailer::new(SmtpConfig::new("localhost").no_starttls()).unwrap();
        let email = Email::new("not-an-address", "to@test.com", "Subject").text("body");

        assert!(mailer.build_message(&email).is_err());
    }
}
