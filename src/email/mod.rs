//! Outbound email (the Notifier collaborator).
//!
//! Backends implement [`Mailer`]:
//! - [`ConsoleMailer`] - prints emails to stdout (for development)
//! - [`SmtpMailer`] - sends emails via SMTP using lettre
//!
//! Delivery on the auth paths is best-effort: the service logs failures
//! and the surrounding account mutation stands.

mod console;
mod smtp;
pub mod templates;

pub use console::ConsoleMailer;
pub use smtp::{SmtpConfig, SmtpMailer};

use crate::error::{LockgateError, Result};
use async_trait::async_trait;

/// An email message to be sent.
#[derive(Debug, Clone)]
pub struct Email {
    /// Sender address (e.g., "no-reply@example.com")
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain text body (optional if html is provided)
    pub text: Option<String>,
    /// HTML body (optional if text is provided)
    pub html: Option<String>,
}

impl Email {
    /// Create a new email with the required fields.
    pub fn new(from: impl Into<String>, to: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            text: None,
            html: None,
        }
    }

    /// Set the plain text body.
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.text = Some(body.into());
        self
    }

    /// Set the HTML body.
    pub fn html(mut self, body: impl Into<String>) -> Self {
        self.html = Some(body.into());
        self
    }

    /// Validate the email has required fields.
    pub fn validate(&self) -> Result<()> {
        if self.from.is_empty() {
            return Err(LockgateError::internal("Email 'from' is required"));
        }
        if self.to.is_empty() {
            return Err(LockgateError::internal("Email 'to' is required"));
        }
        if self.subject.is_empty() {
            return Err(LockgateError::internal("Email 'subject' is required"));
        }
        if self.text.is_none() && self.html.is_none() {
            return Err(LockgateError::internal(
                "Email must have either 'text' or 'html' body",
            ));
        }
        Ok(())
    }
}

/// Mailer trait for sending emails.
///
/// Implement this trait to plug in a different delivery backend.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send an email. Returns an error if delivery failed.
    async fn send(&self, email: &Email) -> Result<()>;

    /// Check if the mailer backend is healthy/connected.
    fn is_healthy(&self) -> bool;
}
