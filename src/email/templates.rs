//! HTML templates for the transactional auth emails.
//!
//! The raw verification/reset token appears only inside the emailed link;
//! the validity window mentioned in the copy tracks the configured TTL.

use std::time::Duration;

use super::Email;
use crate::account::Account;

/// Verification email sent at registration and on resend.
pub fn verification(
    from: &str,
    account: &Account,
    client_url: &str,
    token: &str,
    ttl: Duration,
) -> Email {
    let link = format!("{}/verify-email/{}", client_url, token);
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #333;">Email Verification</h2>
  <p>Hello {name},</p>
  <p>Thank you for registering! Please click the button below to verify your email address:</p>
  <div style="text-align: center; margin: 30px 0;">
    <a href="{link}" style="background-color: #007bff; color: white; padding: 12px 30px; text-decoration: none; border-radius: 5px;">Verify Email</a>
  </div>
  <p>If the button doesn't work, copy and paste this link into your browser:</p>
  <p style="word-break: break-all;">{link}</p>
  <p>This link will expire in {window}.</p>
</div>"#,
        name = account.full_name(),
        link = link,
        window = format_window(ttl),
    );

    Email::new(from, &account.email, "Verify Your Email Address").html(html)
}

/// Password reset email.
pub fn password_reset(
    from: &str,
    account: &Account,
    client_url: &str,
    token: &str,
    ttl: Duration,
) -> Email {
    let link = format!("{}/reset-password/{}", client_url, token);
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #333;">Password Reset Request</h2>
  <p>Hello {name},</p>
  <p>We received a request to reset your password. Click the button below to reset it:</p>
  <div style="text-align: center; margin: 30px 0;">
    <a href="{link}" style="background-color: #dc3545; color: white; padding: 12px 30px; text-decoration: none; border-radius: 5px;">Reset Password</a>
  </div>
  <p>If the button doesn't work, copy and paste this link into your browser:</p>
  <p style="word-break: break-all;">{link}</p>
  <p>This link will expire in {window}.</p>
  <p>If you didn't request a password reset, please ignore this email.</p>
</div>"#,
        name = account.full_name(),
        link = link,
        window = format_window(ttl),
    );

    Email::new(from, &account.email, "Password Reset Request").html(html)
}

/// Welcome email sent once verification succeeds.
pub fn welcome(from: &str, account: &Account, client_url: &str) -> Email {
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #28a745;">Welcome to Our Platform!</h2>
  <p>Hello {name},</p>
  <p>Your account has been successfully verified! Welcome to our platform.</p>
  <p>You can now access all features of your dashboard.</p>
  <div style="text-align: center; margin: 30px 0;">
    <a href="{url}/dashboard" style="background-color: #28a745; color: white; padding: 12px 30px; text-decoration: none; border-radius: 5px;">Go to Dashboard</a>
  </div>
</div>"#,
        name = account.full_name(),
        url = client_url,
    );

    Email::new(from, &account.email, "Welcome to Our Platform!").html(html)
}

fn format_window(ttl: Duration) -> String {
    let secs = ttl.as_secs();
    if secs >= 3600 {
        let hours = secs / 3600;
        if hours == 1 {
            "1 hour".to_string()
        } else {
            format!("{} hours", hours)
        }
    } else {
        format!("{} minutes", secs.max(60) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Role;
    use chrono::Utc;
    use uuid::Uuid;

    fn account() -> Account {
        Account {
            id: Uuid::new_v4(),
            email: "ann@ex.com".to_string(),
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role: Role::User,
            is_verified: false,
            verification_token: None,
            verification_expires: None,
            reset_token: None,
            reset_expires: None,
            login_attempts: 0,
            lock_until: None,
            last_login: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_verification_email_embeds_link_and_window() {
        let email = verification(
            "no-reply@ex.com",
            &account(),
            "https://app.ex.com",
            "tok123",
            Duration::from_secs(24 * 3600),
        );

        assert_eq!(email.to, "ann@ex.com");
        assert_eq!(email.subject, "Verify Your Email Address");
        let html = email.html.unwrap();
        assert!(html.contains("https://app.ex.com/verify-email/tok123"));
        assert!(html.contains("24 hours"));
        assert!(html.contains("Hello Ann Lee"));
    }

    #[test]
    fn test_reset_email_embeds_link_and_window() {
        let email = password_reset(
            "no-reply@ex.com",
            &account(),
            "https://app.ex.com",
            "tok456",
            Duration::from_secs(3600),
        );

        assert_eq!(email.subject, "Password Reset Request");
        let html = email.html.unwrap();
        assert!(html.contains("https://app.ex.com/reset-password/tok456"));
        assert!(html.contains("1 hour."));
    }

    #[test]
    fn test_welcome_email_links_dashboard() {
        let email = welcome("no-reply@ex.com", &account(), "https://app.ex.com");
        assert!(email.html.unwrap().contains("https://app.ex.com/dashboard"));
    }

    #[test]
    fn test_format_window() {
        assert_eq!(format_window(Duration::from_secs(3600)), "1 hour");
        assert_eq!(format_window(Duration::from_secs(24 * 3600)), "24 hours");
        assert_eq!(format_window(Duration::from_secs(900)), "15 minutes");
    }
}
