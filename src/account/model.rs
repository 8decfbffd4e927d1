//! The account entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role. Defaults to [`Role::User`]; not settable at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// One record per registered email address.
///
/// The stored verification/reset token fields hold SHA-256 digests of the
/// emailed tokens, never the raw values, and are present only while the
/// corresponding flow is pending. `password_hash` is a derived credential
/// and is never serialized into API responses.
#[derive(Debug, Clone)]
pub struct Account {
    /// Store-assigned, immutable.
    pub id: Uuid,
    /// Unique case-insensitively; normalized to lowercase before storage.
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub role: Role,
    /// Monotonic: once true, never reverts.
    pub is_verified: bool,
    pub verification_token: Option<String>,
    pub verification_expires: Option<DateTime<Utc>>,
    pub reset_token: Option<String>,
    pub reset_expires: Option<DateTime<Utc>>,
    /// Failed-password counter; reset on success or lock expiry.
    pub login_attempts: u32,
    /// A value in the past is equivalent to "not locked".
    pub lock_until: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Display name used in email salutations.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whether the account is locked as of `now`.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.lock_until.is_some_and(|until| until > now)
    }

    /// Whether an unexpired verification token is pending.
    pub fn has_pending_verification(&self, now: DateTime<Utc>) -> bool {
        self.verification_token.is_some()
            && self.verification_expires.is_some_and(|expires| expires > now)
    }
}

/// Input to [`super::AccountStore::insert`]. The store assigns `id` and
/// `created_at`; everything else starts at its registration default.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    /// Already normalized to lowercase.
    pub email: String,
    pub password_hash: String,
    /// Digest of the emailed verification token.
    pub verification_token: String,
    pub verification_expires: DateTime<Utc>,
}
