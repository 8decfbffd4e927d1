//! Account persistence.
//!
//! [`AccountStore`] is the seam between the auth service and whatever
//! storage engine backs it. Every mutation is atomic per account: the
//! whole read-modify-write must be a single conditional update (or happen
//! under one lock), so concurrent logins cannot lose attempt-counter
//! updates or leave partial token state visible.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::auth::lockout::{FailedLoginOutcome, LockoutPolicy};
use crate::error::{LockgateError, Result};

use super::model::{Account, NewAccount, Role};

/// Storage operations required by the auth flows.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Create an account. Fails with [`LockgateError::Conflict`] if the
    /// email is already registered.
    async fn insert(&self, new: NewAccount) -> Result<Account>;

    /// Find an account by its unique id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>>;

    /// Find an account by (normalized) email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Find the account holding this verification token digest, provided
    /// the token has not expired as of `now`.
    async fn find_by_verification_token(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>>;

    /// Find the account holding this reset token digest, provided the
    /// token has not expired as of `now`.
    async fn find_by_reset_token(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>>;

    /// Set (or rotate) the pending verification token.
    async fn set_verification_token(
        &self,
        id: Uuid,
        token_digest: &str,
        expires: DateTime<Utc>,
    ) -> Result<()>;

    /// Mark the account verified and clear the pending verification token.
    /// Verification is monotonic; an already-verified account stays verified.
    async fn mark_verified(&self, id: Uuid) -> Result<Account>;

    /// Set (or rotate) the pending password reset token.
    async fn set_reset_token(
        &self,
        id: Uuid,
        token_digest: &str,
        expires: DateTime<Utc>,
    ) -> Result<()>;

    /// Install a new password hash, clearing the reset token and any lock
    /// state in the same atomic step.
    async fn complete_password_reset(&self, id: Uuid, password_hash: &str) -> Result<()>;

    /// Record a failed password check: increment the attempt counter and
    /// apply the lock if the policy threshold is reached. An expired lock
    /// observed here is healed first (counter restarts).
    async fn record_login_failure(
        &self,
        id: Uuid,
        policy: &LockoutPolicy,
    ) -> Result<FailedLoginOutcome>;

    /// Record a successful login: clear attempts and lock state, stamp
    /// `last_login`, and return the updated account.
    async fn record_login_success(&self, id: Uuid) -> Result<Account>;

    /// Clear the attempt counter and lock window (admin unlock or
    /// post-reset cleanup).
    async fn clear_lock_state(&self, id: Uuid) -> Result<()>;
}

/// In-memory reference store.
///
/// One `RwLock` guards the account map and the email index together, so
/// each trait method is a single atomic read-modify-write.
#[derive(Default)]
pub struct InMemoryAccountStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    accounts: HashMap<Uuid, Account>,
    email_index: HashMap<String, Uuid>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing_account() -> LockgateError {
    LockgateError::internal("Account disappeared mid-operation")
}

/// Treat an expired lock as already unlocked: clear the window and restart
/// the counter.
fn heal_expired_lock(account: &mut Account, now: DateTime<Utc>) {
    if account.lock_until.is_some_and(|until| until <= now) {
        account.lock_until = None;
        account.login_attempts = 0;
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn insert(&self, new: NewAccount) -> Result<Account> {
        let mut inner = self.inner.write().unwrap();

        if inner.email_index.contains_key(&new.email) {
            return Err(LockgateError::Conflict);
        }

        let account = Account {
            id: Uuid::new_v4(),
            email: new.email.clone(),
            first_name: new.first_name,
            last_name: new.last_name,
            password_hash: new.password_hash,
            role: Role::default(),
            is_verified: false,
            verification_token: Some(new.verification_token),
            verification_expires: Some(new.verification_expires),
            reset_token: None,
            reset_expires: None,
            login_attempts: 0,
            lock_until: None,
            last_login: None,
            created_at: Utc::now(),
        };

        inner.email_index.insert(new.email, account.id);
        inner.accounts.insert(account.id, account.clone());

        Ok(account)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .email_index
            .get(email)
            .and_then(|id| inner.accounts.get(id))
            .cloned())
    }

    async fn find_by_verification_token(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .accounts
            .values()
            .find(|a| {
                a.verification_token.as_deref() == Some(token_digest)
                    && a.verification_expires.is_some_and(|expires| expires > now)
            })
            .cloned())
    }

    async fn find_by_reset_token(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .accounts
            .values()
            .find(|a| {
                a.reset_token.as_deref() == Some(token_digest)
                    && a.reset_expires.is_some_and(|expires| expires > now)
            })
            .cloned())
    }

    async fn set_verification_token(
        &self,
        id: Uuid,
        token_digest: &str,
        expires: DateTime<Utc>,
    ) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let account = inner.accounts.get_mut(&id).ok_or_else(missing_account)?;

        account.verification_token = Some(token_digest.to_string());
        account.verification_expires = Some(expires);
        Ok(())
    }

    async fn mark_verified(&self, id: Uuid) -> Result<Account> {
        let mut inner = self.inner.write().unwrap();
        let account = inner.accounts.get_mut(&id).ok_or_else(missing_account)?;

        account.is_verified = true;
        account.verification_token = None;
        account.verification_expires = None;
        Ok(account.clone())
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token_digest: &str,
        expires: DateTime<Utc>,
    ) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let account = inner.accounts.get_mut(&id).ok_or_else(missing_account)?;

        account.reset_token = Some(token_digest.to_string());
        account.reset_expires = Some(expires);
        Ok(())
    }

    async fn complete_password_reset(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let account = inner.accounts.get_mut(&id).ok_or_else(missing_account)?;

        account.password_hash = password_hash.to_string();
        account.reset_token = None;
        account.reset_expires = None;
        account.login_attempts = 0;
        account.lock_until = None;
        Ok(())
    }

    async fn record_login_failure(
        &self,
        id: Uuid,
        policy: &LockoutPolicy,
    ) -> Result<FailedLoginOutcome> {
        let mut inner = self.inner.write().unwrap();
        let account = inner.accounts.get_mut(&id).ok_or_else(missing_account)?;

        let now = Utc::now();
        heal_expired_lock(account, now);

        account.login_attempts += 1;

        let mut just_locked = false;
        if account.login_attempts >= policy.max_attempts {
            account.lock_until = Some(policy.lock_expiry(now));
            if policy.reset_attempts_on_lock {
                account.login_attempts = 0;
            }
            just_locked = true;
        }

        Ok(FailedLoginOutcome {
            attempts: account.login_attempts,
            locked_until: account.lock_until,
            just_locked,
        })
    }

    async fn record_login_success(&self, id: Uuid) -> Result<Account> {
        let mut inner = self.inner.write().unwrap();
        let account = inner.accounts.get_mut(&id).ok_or_else(missing_account)?;

        account.login_attempts = 0;
        account.lock_until = None;
        account.last_login = Some(Utc::now());
        Ok(account.clone())
    }

    async fn clear_lock_state(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let account = inner.accounts.get_mut(&id).ok_or_else(missing_account)?;

        account.login_attempts = 0;
        account.lock_until = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            verification_token: "digest".to_string(),
            verification_expires: Utc::now() + Duration::from_secs(3600),
        }
    }

    #[tokio::test]
    async fn test_insert_defaults() {
        let store = InMemoryAccountStore::new();
        let account = store.insert(new_account("ann@ex.com")).await.unwrap();

        assert!(!account.is_verified);
        assert_eq!(account.role, Role::User);
        assert_eq!(account.login_attempts, 0);
        assert!(account.lock_until.is_none());
        assert!(account.last_login.is_none());
        assert!(account.has_pending_verification(Utc::now()));
    }

    #[tokio::test]
    async fn test_insert_duplicate_email_conflicts() {
        let store = InMemoryAccountStore::new();
        store.insert(new_account("ann@ex.com")).await.unwrap();

        let err = store.insert(new_account("ann@ex.com")).await.unwrap_err();
        assert!(matches!(err, LockgateError::Conflict));
    }

    #[tokio::test]
    async fn test_find_by_email_and_id() {
        let store = InMemoryAccountStore::new();
        let account = store.insert(new_account("ann@ex.com")).await.unwrap();

        assert_eq!(
            store.find_by_email("ann@ex.com").await.unwrap().unwrap().id,
            account.id
        );
        assert!(store.find_by_email("bob@ex.com").await.unwrap().is_none());
        assert!(store.find_by_id(account.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_verification_token_lookup_respects_expiry() {
        let store = InMemoryAccountStore::new();
        let account = store.insert(new_account("ann@ex.com")).await.unwrap();
        let now = Utc::now();

        assert!(
            store
                .find_by_verification_token("digest", now)
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            store
                .find_by_verification_token("other", now)
                .await
                .unwrap()
                .is_none()
        );

        // Expired token behaves as absent
        store
            .set_verification_token(account.id, "digest", now - Duration::from_secs(1))
            .await
            .unwrap();
        assert!(
            store
                .find_by_verification_token("digest", now)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_mark_verified_is_monotonic_and_clears_token() {
        let store = InMemoryAccountStore::new();
        let account = store.insert(new_account("ann@ex.com")).await.unwrap();

        let verified = store.mark_verified(account.id).await.unwrap();
        assert!(verified.is_verified);
        assert!(verified.verification_token.is_none());
        assert!(verified.verification_expires.is_none());

        // A second call keeps it verified
        let again = store.mark_verified(account.id).await.unwrap();
        assert!(again.is_verified);
    }

    #[tokio::test]
    async fn test_reset_token_lookup_respects_expiry() {
        let store = InMemoryAccountStore::new();
        let account = store.insert(new_account("ann@ex.com")).await.unwrap();
        let now = Utc::now();

        store
            .set_reset_token(account.id, "reset-digest", now + Duration::from_secs(3600))
            .await
            .unwrap();
        assert!(
            store
                .find_by_reset_token("reset-digest", now)
                .await
                .unwrap()
                .is_some()
        );

        store
            .set_reset_token(account.id, "reset-digest", now - Duration::from_secs(1))
            .await
            .unwrap();
        assert!(
            store
                .find_by_reset_token("reset-digest", now)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_failures_lock_at_threshold() {
        let store = InMemoryAccountStore::new();
        let account = store.insert(new_account("ann@ex.com")).await.unwrap();
        let policy = LockoutPolicy::default();

        for expected in 1..5 {
            let outcome = store
                .record_login_failure(account.id, &policy)
                .await
                .unwrap();
            assert_eq!(outcome.attempts, expected);
            assert!(!outcome.just_locked);
            assert!(outcome.locked_until.is_none());
        }

        let outcome = store
            .record_login_failure(account.id, &policy)
            .await
            .unwrap();
        assert!(outcome.just_locked);
        assert!(outcome.locked_until.is_some());
        // Counter restarts under the lock by default
        assert_eq!(outcome.attempts, 0);
    }

    #[tokio::test]
    async fn test_attempts_persist_through_lock_when_configured() {
        let store = InMemoryAccountStore::new();
        let account = store.insert(new_account("ann@ex.com")).await.unwrap();
        let policy = LockoutPolicy::new()
            .max_attempts(2)
            .persist_attempts_through_lock();

        store
            .record_login_failure(account.id, &policy)
            .await
            .unwrap();
        let outcome = store
            .record_login_failure(account.id, &policy)
            .await
            .unwrap();

        assert!(outcome.just_locked);
        assert_eq!(outcome.attempts, 2);
    }

    #[tokio::test]
    async fn test_expired_lock_heals_on_next_failure() {
        let store = InMemoryAccountStore::new();
        let account = store.insert(new_account("ann@ex.com")).await.unwrap();
        // Zero-length lock expires immediately
        let policy = LockoutPolicy::new()
            .max_attempts(2)
            .lockout_duration(Duration::ZERO);

        store
            .record_login_failure(account.id, &policy)
            .await
            .unwrap();
        let locked = store
            .record_login_failure(account.id, &policy)
            .await
            .unwrap();
        assert!(locked.just_locked);

        // Lock already expired, so the next failure starts a fresh count
        let outcome = store
            .record_login_failure(account.id, &policy)
            .await
            .unwrap();
        assert_eq!(outcome.attempts, 1);
        assert!(!outcome.just_locked);
    }

    #[tokio::test]
    async fn test_login_success_clears_lock_state() {
        let store = InMemoryAccountStore::new();
        let account = store.insert(new_account("ann@ex.com")).await.unwrap();
        let policy = LockoutPolicy::default();

        for _ in 0..3 {
            store
                .record_login_failure(account.id, &policy)
                .await
                .unwrap();
        }

        let updated = store.record_login_success(account.id).await.unwrap();
        assert_eq!(updated.login_attempts, 0);
        assert!(updated.lock_until.is_none());
        assert!(updated.last_login.is_some());
    }

    #[tokio::test]
    async fn test_password_reset_clears_token_and_lock() {
        let store = InMemoryAccountStore::new();
        let account = store.insert(new_account("ann@ex.com")).await.unwrap();
        let now = Utc::now();

        store
            .set_reset_token(account.id, "reset-digest", now + Duration::from_secs(3600))
            .await
            .unwrap();
        let policy = LockoutPolicy::new().max_attempts(1);
        store
            .record_login_failure(account.id, &policy)
            .await
            .unwrap();

        store
            .complete_password_reset(account.id, "$argon2id$new")
            .await
            .unwrap();

        let updated = store.find_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(updated.password_hash, "$argon2id$new");
        assert!(updated.reset_token.is_none());
        assert!(updated.reset_expires.is_none());
        assert_eq!(updated.login_attempts, 0);
        assert!(updated.lock_until.is_none());
    }

    #[tokio::test]
    async fn test_clear_lock_state() {
        let store = InMemoryAccountStore::new();
        let account = store.insert(new_account("ann@ex.com")).await.unwrap();
        let policy = LockoutPolicy::new().max_attempts(1);

        let outcome = store
            .record_login_failure(account.id, &policy)
            .await
            .unwrap();
        assert!(outcome.just_locked);

        store.clear_lock_state(account.id).await.unwrap();

        let updated = store.find_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(updated.login_attempts, 0);
        assert!(updated.lock_until.is_none());
    }
}
