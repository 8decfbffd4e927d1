//! The authentication service.
//!
//! Orchestrates the account credential lifecycle: registration, login with
//! lockout, email verification, password reset, and verification resend.
//! Composes the account store, password hasher, token generator, lockout
//! policy, session issuer, and the mailer collaborator.
//!
//! This module emits tracing events for security monitoring:
//! - `auth.register` - Account created (verification pending)
//! - `auth.login` / `auth.login.locked` - Login outcomes
//! - `auth.verify` - Email verified
//! - `auth.password.reset_requested` / `auth.password.reset_completed`
//! - `auth.notify` - Best-effort email delivery failures

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::account::{Account, AccountStore, NewAccount};
use crate::config::AuthConfig;
use crate::email::{Email, Mailer, templates};
use crate::error::{FieldError, LockgateError, Result};

use super::lockout::LockoutPolicy;
use super::password::{PasswordHasher, PasswordPolicy};
use super::session::{SessionClaims, SessionTokenIssuer};
use super::token;
use super::types::{LoginRequest, RegisterRequest};

/// Orchestrates all account authentication operations.
///
/// Each operation is atomic from the caller's perspective: the account
/// mutation commits in a single store call, and mailer failures never roll
/// it back (delivery is best-effort, bounded by `notify_timeout`).
pub struct AuthService {
    store: Arc<dyn AccountStore>,
    mailer: Arc<dyn Mailer>,
    sessions: SessionTokenIssuer,
    hasher: PasswordHasher,
    password_policy: PasswordPolicy,
    lockout: LockoutPolicy,
    verification_token_ttl: Duration,
    reset_token_ttl: Duration,
    notify_timeout: Duration,
    client_url: String,
    email_from: String,
}

impl AuthService {
    /// Create a new auth service.
    pub fn new(
        store: Arc<dyn AccountStore>,
        mailer: Arc<dyn Mailer>,
        sessions: SessionTokenIssuer,
        auth: &AuthConfig,
        lockout: LockoutPolicy,
    ) -> Self {
        Self {
            store,
            mailer,
            sessions,
            hasher: PasswordHasher::default(),
            password_policy: PasswordPolicy::standard(),
            lockout,
            verification_token_ttl: auth.verification_token_ttl,
            reset_token_ttl: auth.reset_token_ttl,
            notify_timeout: auth.notify_timeout,
            client_url: auth.client_url.clone(),
            email_from: auth.email_from.clone(),
        }
    }

    /// Set a custom password hasher.
    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Set a custom password policy.
    pub fn with_password_policy(mut self, policy: PasswordPolicy) -> Self {
        self.password_policy = policy;
        self
    }

    /// Set a custom lockout policy.
    pub fn with_lockout(mut self, lockout: LockoutPolicy) -> Self {
        self.lockout = lockout;
        self
    }

    /// Register a new account.
    ///
    /// On success the account exists unverified, holds a pending
    /// verification token, and a verification email has been dispatched
    /// (best-effort).
    pub async fn register(&self, req: RegisterRequest) -> Result<Account> {
        let first_name = req.first_name.trim().to_string();
        let last_name = req.last_name.trim().to_string();
        let email = normalize_email(&req.email);

        let mut errors = Vec::new();
        if !valid_name(&first_name) {
            errors.push(FieldError::new(
                "firstName",
                "First name must be 2-50 characters",
            ));
        }
        if !valid_name(&last_name) {
            errors.push(FieldError::new(
                "lastName",
                "Last name must be 2-50 characters",
            ));
        }
        if !is_valid_email(&email) {
            errors.push(FieldError::new("email", "Please provide a valid email"));
        }
        errors.extend(self.password_policy.field_errors(&req.password));
        if !errors.is_empty() {
            return Err(LockgateError::Validation(errors));
        }

        let password_hash = self.hasher.hash(&req.password)?;
        let verification_token = token::generate();
        let expires = Utc::now() + self.verification_token_ttl;

        // Uniqueness is enforced by the store; a losing racer gets Conflict.
        let account = self
            .store
            .insert(NewAccount {
                first_name,
                last_name,
                email,
                password_hash,
                verification_token: token::digest(&verification_token),
                verification_expires: expires,
            })
            .await?;

        tracing::info!(
            target: "auth.register",
            account_id = %account.id,
            email = %account.email,
            "Account registered, verification pending"
        );

        self.notify(templates::verification(
            &self.email_from,
            &account,
            &self.client_url,
            &verification_token,
            self.verification_token_ttl,
        ))
        .await;

        Ok(account)
    }

    /// Authenticate with email and password, returning a session token and
    /// the account.
    ///
    /// Check order: lock window first (no password work for locked
    /// accounts), then the password, then the verification flag. Unknown
    /// emails and wrong passwords are indistinguishable to the caller.
    pub async fn login(&self, req: LoginRequest) -> Result<(String, Account)> {
        let email = normalize_email(&req.email);

        let mut errors = Vec::new();
        if !is_valid_email(&email) {
            errors.push(FieldError::new("email", "Please provide a valid email"));
        }
        if req.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        }
        if !errors.is_empty() {
            return Err(LockgateError::Validation(errors));
        }

        let account = match self.store.find_by_email(&email).await? {
            Some(account) => account,
            None => {
                // Burn a hash so unknown emails cost the same as mismatches
                let _ = self.hasher.hash("dummy-password");
                return Err(LockgateError::InvalidCredentials);
            }
        };

        if account.is_locked(Utc::now()) {
            tracing::info!(
                target: "auth.login.locked",
                account_id = %account.id,
                "Login rejected: account locked"
            );
            return Err(LockgateError::Locked);
        }

        if !self.hasher.verify(&req.password, &account.password_hash)? {
            let outcome = self
                .store
                .record_login_failure(account.id, &self.lockout)
                .await?;
            if outcome.just_locked {
                tracing::warn!(
                    target: "auth.login.locked",
                    account_id = %account.id,
                    locked_until = ?outcome.locked_until,
                    "Account locked after repeated failed logins"
                );
            }
            return Err(LockgateError::InvalidCredentials);
        }

        if !account.is_verified {
            return Err(LockgateError::UnverifiedEmail);
        }

        let account = self.store.record_login_success(account.id).await?;
        let token = self.sessions.issue(account.id)?;

        tracing::info!(target: "auth.login", account_id = %account.id, "Login successful");

        Ok((token, account))
    }

    /// Verify an email address using an emailed token.
    ///
    /// Succeeding clears the pending token, so a second call with the same
    /// token fails while `is_verified` stays true.
    pub async fn verify_email(&self, raw_token: &str) -> Result<Account> {
        let account = self
            .store
            .find_by_verification_token(&token::digest(raw_token), Utc::now())
            .await?
            .ok_or_else(|| {
                LockgateError::invalid_token("Invalid or expired verification token")
            })?;

        let account = self.store.mark_verified(account.id).await?;

        tracing::info!(target: "auth.verify", account_id = %account.id, "Email verified");

        self.notify(templates::welcome(
            &self.email_from,
            &account,
            &self.client_url,
        ))
        .await;

        Ok(account)
    }

    /// Start a password reset by emailing a reset link.
    pub async fn forgot_password(&self, raw_email: &str) -> Result<()> {
        let email = normalize_email(raw_email);
        if email.is_empty() {
            return Err(LockgateError::validation("email", "Email is required"));
        }

        let account = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or_else(|| LockgateError::not_found("User with this email address not found"))?;

        let reset_token = token::generate();
        let expires = Utc::now() + self.reset_token_ttl;
        self.store
            .set_reset_token(account.id, &token::digest(&reset_token), expires)
            .await?;

        tracing::info!(
            target: "auth.password.reset_requested",
            account_id = %account.id,
            expires_in_secs = self.reset_token_ttl.as_secs(),
            "Password reset requested"
        );

        self.notify(templates::password_reset(
            &self.email_from,
            &account,
            &self.client_url,
            &reset_token,
            self.reset_token_ttl,
        ))
        .await;

        Ok(())
    }

    /// Complete a password reset with an emailed token.
    ///
    /// Installs the new hash and clears the reset token and any lock state
    /// in one atomic store step.
    pub async fn reset_password(&self, raw_token: &str, new_password: &str) -> Result<()> {
        self.password_policy.check(new_password)?;

        let account = self
            .store
            .find_by_reset_token(&token::digest(raw_token), Utc::now())
            .await?
            .ok_or_else(|| LockgateError::invalid_token("Invalid or expired reset token"))?;

        let password_hash = self.hasher.hash(new_password)?;
        self.store
            .complete_password_reset(account.id, &password_hash)
            .await?;

        tracing::info!(
            target: "auth.password.reset_completed",
            account_id = %account.id,
            "Password reset completed"
        );

        Ok(())
    }

    /// Rotate the verification token and resend the verification email.
    pub async fn resend_verification(&self, raw_email: &str) -> Result<()> {
        let email = normalize_email(raw_email);
        if email.is_empty() {
            return Err(LockgateError::validation("email", "Email is required"));
        }

        let account = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or_else(|| LockgateError::not_found("User with this email address not found"))?;

        if account.is_verified {
            return Err(LockgateError::AlreadyVerified);
        }

        let verification_token = token::generate();
        let expires = Utc::now() + self.verification_token_ttl;
        self.store
            .set_verification_token(account.id, &token::digest(&verification_token), expires)
            .await?;

        tracing::info!(
            target: "auth.resend_verification",
            account_id = %account.id,
            "Verification token rotated"
        );

        self.notify(templates::verification(
            &self.email_from,
            &account,
            &self.client_url,
            &verification_token,
            self.verification_token_ttl,
        ))
        .await;

        Ok(())
    }

    /// Verify a bearer session token.
    pub fn verify_session(&self, token: &str) -> Result<SessionClaims> {
        self.sessions.verify(token)
    }

    /// Load an account by id (used by the request-authentication seam).
    pub async fn account_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        self.store.find_by_id(id).await
    }

    /// Whether the notifier backend reports healthy.
    pub fn notifier_healthy(&self) -> bool {
        self.mailer.is_healthy()
    }

    /// Send an email without failing the surrounding operation. Bounded by
    /// the configured notify timeout; failures are logged.
    async fn notify(&self, email: Email) {
        match tokio::time::timeout(self.notify_timeout, self.mailer.send(&email)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(
                    target: "auth.notify",
                    error = %e,
                    subject = %email.subject,
                    "Failed to send email"
                );
            }
            Err(_) => {
                tracing::warn!(
                    target: "auth.notify",
                    subject = %email.subject,
                    timeout_secs = self.notify_timeout.as_secs(),
                    "Email send timed out"
                );
            }
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn valid_name(name: &str) -> bool {
    let len = name.chars().count();
    (2..=50).contains(&len)
}

/// Basic email validation: local part, one `@`, dotted domain.
fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }

    let local = parts[0];
    let domain = parts[1];

    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
