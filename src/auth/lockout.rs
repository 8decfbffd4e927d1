//! Account lockout policy.
//!
//! Failed password checks increment a per-account counter; reaching the
//! threshold applies a temporary lock. Unlock is lazy: there is no
//! background sweep, an expired `lock_until` is treated as unlocked and
//! healed by the next login attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default maximum failed attempts before lockout.
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default lockout duration (2 hours).
const DEFAULT_LOCKOUT_DURATION: Duration = Duration::from_secs(2 * 60 * 60);

/// Lockout policy configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutPolicy {
    /// Maximum failed attempts before the account is locked.
    pub max_attempts: u32,
    /// How long the account stays locked.
    pub lockout_duration: Duration,
    /// Whether the failed-attempt counter restarts at zero when a lock is
    /// applied, so counting begins fresh once the lock expires.
    pub reset_attempts_on_lock: bool,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            lockout_duration: DEFAULT_LOCKOUT_DURATION,
            reset_attempts_on_lock: true,
        }
    }
}

impl LockoutPolicy {
    /// Create a new policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a strict policy (3 attempts, 30 min lockout).
    #[must_use]
    pub fn strict() -> Self {
        Self {
            max_attempts: 3,
            lockout_duration: Duration::from_secs(30 * 60),
            reset_attempts_on_lock: true,
        }
    }

    /// Set the maximum failed attempts before lockout.
    #[must_use]
    pub fn max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    /// Set the lockout duration.
    #[must_use]
    pub fn lockout_duration(mut self, duration: Duration) -> Self {
        self.lockout_duration = duration;
        self
    }

    /// Keep the failed-attempt counter across a lock instead of resetting
    /// it, so post-lock failures re-lock immediately.
    #[must_use]
    pub fn persist_attempts_through_lock(mut self) -> Self {
        self.reset_attempts_on_lock = false;
        self
    }

    /// Compute the lock expiry for a lock applied at `now`.
    #[must_use]
    pub fn lock_expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.lockout_duration
    }
}

/// Result of recording a failed login attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedLoginOutcome {
    /// Failed-attempt count after this failure.
    pub attempts: u32,
    /// When the lock expires, if the account is locked.
    pub locked_until: Option<DateTime<Utc>>,
    /// Whether this attempt triggered the lock.
    pub just_locked: bool,
}

impl FailedLoginOutcome {
    /// Whether the account is locked as of `now`.
    #[must_use]
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }
}
