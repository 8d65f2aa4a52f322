//! In-memory account store.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use tokio::sync::RwLock;

use super::{AccountStore, PasswordCheck, PasswordHasher, StoreError};
use crate::types::{Account, Claim, ClaimSet, LockoutState};
use crate::{Error, Result};

/// Tracing target for the in-memory store.
const TRACING_TARGET: &str = "portico_core::store::memory";

/// Failed-attempt lockout settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Consecutive failures that trigger a lock; zero disables lockout.
    pub max_failed_attempts: u32,
    /// How long a triggered lock lasts.
    pub lockout_duration: SignedDuration,
}

impl LockoutPolicy {
    /// Longest accepted lock window.
    pub const MAX_DURATION: SignedDuration = SignedDuration::from_hours(24 * 365);

    /// Returns a policy that never locks accounts.
    pub fn disabled() -> Self {
        Self {
            max_failed_attempts: 0,
            lockout_duration: SignedDuration::ZERO,
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.max_failed_attempts > 0
    }

    /// Checks that the lock window is within `0..=MAX_DURATION`.
    pub fn validate(&self) -> Result<()> {
        if self.lockout_duration.is_negative() || self.lockout_duration > Self::MAX_DURATION {
            return Err(Error::config(format!(
                "lockout duration must be between 0 and {} hours, got {}s",
                Self::MAX_DURATION.as_hours(),
                self.lockout_duration.as_secs()
            )));
        }

        Ok(())
    }

    /// Returns the end of a lock starting at `now`, saturating at the last
    /// representable instant.
    fn lock_until(&self, now: Timestamp) -> Timestamp {
        now.checked_add(self.lockout_duration)
            .unwrap_or(Timestamp::MAX)
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            lockout_duration: SignedDuration::from_mins(5),
        }
    }
}

/// Password strength rules applied at account creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordRules {
    pub required_length: usize,
    pub require_digit: bool,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_non_alphanumeric: bool,
}

impl PasswordRules {
    /// Returns one message per rule `password` breaks.
    pub fn violations(&self, password: &str) -> Vec<String> {
        let mut errors = Vec::new();

        if password.chars().count() < self.required_length {
            errors.push(format!(
                "Passwords must be at least {} characters.",
                self.required_length
            ));
        }
        if self.require_non_alphanumeric && password.chars().all(char::is_alphanumeric) {
            errors.push("Passwords must have at least one non alphanumeric character.".to_owned());
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            errors.push("Passwords must have at least one digit ('0'-'9').".to_owned());
        }
        if self.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
            errors.push("Passwords must have at least one lowercase ('a'-'z').".to_owned());
        }
        if self.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
            errors.push("Passwords must have at least one uppercase ('A'-'Z').".to_owned());
        }

        errors
    }
}

impl Default for PasswordRules {
    fn default() -> Self {
        Self {
            required_length: 6,
            require_digit: false,
            require_lowercase: false,
            require_uppercase: false,
            require_non_alphanumeric: false,
        }
    }
}

/// Behaviour switches of [`MemoryAccountStore`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub lockout: LockoutPolicy,
    pub password_rules: PasswordRules,
    /// Reject sign-in for accounts whose email is not confirmed.
    pub require_confirmed_email: bool,
}

struct StoredAccount {
    account: Account,
    password_hash: String,
}

/// Account store kept in process memory, keyed by normalized email.
///
/// Cloning shares the same accounts.
#[derive(Clone)]
pub struct MemoryAccountStore {
    inner: Arc<MemoryStoreInner>,
}

struct MemoryStoreInner {
    accounts: RwLock<HashMap<String, StoredAccount>>,
    hasher: PasswordHasher,
    options: StoreOptions,
}

impl MemoryAccountStore {
    /// Creates an empty store with default Argon2id parameters.
    pub fn new(options: StoreOptions) -> Self {
        Self::with_hasher(options, PasswordHasher::new())
    }

    /// Creates an empty store with the given hasher.
    pub fn with_hasher(options: StoreOptions, hasher: PasswordHasher) -> Self {
        tracing::debug!(
            target: TRACING_TARGET,
            max_failed_attempts = options.lockout.max_failed_attempts,
            lockout_secs = options.lockout.lockout_duration.as_secs(),
            require_confirmed_email = options.require_confirmed_email,
            "Account store created",
        );

        let inner = Arc::new(MemoryStoreInner {
            accounts: RwLock::new(HashMap::new()),
            hasher,
            options,
        });

        Self { inner }
    }

    #[inline]
    pub fn options(&self) -> &StoreOptions {
        &self.inner.options
    }

    /// Returns the number of stored accounts.
    pub async fn len(&self) -> usize {
        self.inner.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.accounts.read().await.is_empty()
    }

    /// Looks up an account by email, ignoring case and surrounding whitespace.
    pub async fn find_by_email(&self, email: &str) -> Option<Account> {
        let accounts = self.inner.accounts.read().await;
        accounts
            .get(&normalize_email(email))
            .map(|stored| stored.account.clone())
    }

    /// Appends a role to the account unless it already has it.
    pub async fn add_to_role(&self, email: &str, role: impl Into<String>) -> Result<()> {
        let role = role.into();
        self.update(email, |account| {
            if !account.roles.contains(&role) {
                account.roles.push(role);
            }
        })
        .await
    }

    /// Appends a custom claim to the account.
    pub async fn add_claim(&self, email: &str, claim: Claim) -> Result<()> {
        self.update(email, |account| account.claims.push(claim)).await
    }

    /// Marks the account's email as confirmed.
    pub async fn confirm_email(&self, email: &str) -> Result<()> {
        self.set_email_confirmed(email, true).await
    }

    pub async fn set_email_confirmed(&self, email: &str, confirmed: bool) -> Result<()> {
        self.update(email, |account| account.email_confirmed = confirmed)
            .await
    }

    /// Clears the lock window and failed-attempt counter.
    pub async fn unlock(&self, email: &str) -> Result<()> {
        self.update(email, |account| account.lockout = LockoutState::default())
            .await
    }

    async fn update(&self, email: &str, f: impl FnOnce(&mut Account)) -> Result<()> {
        let mut accounts = self.inner.accounts.write().await;
        let stored = accounts
            .get_mut(&normalize_email(email))
            .ok_or_else(|| Error::store(format!("no account registered for '{email}'")))?;
        f(&mut stored.account);
        Ok(())
    }

    async fn stored_account<T>(&self, account: &Account, f: impl FnOnce(&Account) -> T) -> Result<T> {
        let accounts = self.inner.accounts.read().await;
        accounts
            .get(&normalize_email(&account.email))
            .filter(|stored| stored.account.id == account.id)
            .map(|stored| f(&stored.account))
            .ok_or_else(|| Error::store(format!("account {} no longer exists", account.id)))
    }
}

impl Default for MemoryAccountStore {
    fn default() -> Self {
        Self::new(StoreOptions::default())
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn create_account(&self, email: &str, password: &str) -> Result<Account, StoreError> {
        let key = normalize_email(email);

        let mut errors = Vec::new();
        if self.inner.accounts.read().await.contains_key(&key) {
            errors.push(duplicate_email_message(email));
        }
        errors.extend(self.inner.options.password_rules.violations(password));

        if !errors.is_empty() {
            tracing::debug!(
                target: TRACING_TARGET,
                error_count = errors.len(),
                "Account creation rejected",
            );
            return Err(StoreError::Rejected(errors));
        }

        let password_hash = self.inner.hasher.hash_password(password)?;
        let account = Account::new(email.trim());

        let mut accounts = self.inner.accounts.write().await;
        match accounts.entry(key) {
            Entry::Occupied(_) => Err(StoreError::Rejected(vec![duplicate_email_message(email)])),
            Entry::Vacant(entry) => {
                entry.insert(StoredAccount {
                    account: account.clone(),
                    password_hash,
                });

                tracing::info!(
                    target: TRACING_TARGET,
                    account_id = %account.id,
                    "Account created",
                );

                Ok(account)
            }
        }
    }

    async fn verify_password(&self, email: &str, password: &str) -> Result<PasswordCheck> {
        let key = normalize_email(email);
        let now = Timestamp::now();
        let options = &self.inner.options;

        let snapshot = {
            let accounts = self.inner.accounts.read().await;
            accounts
                .get(&key)
                .map(|stored| (stored.account.clone(), stored.password_hash.clone()))
        };

        let Some((account, password_hash)) = snapshot else {
            self.inner.hasher.verify_dummy_password(password);
            tracing::debug!(target: TRACING_TARGET, "Login attempt for unknown account");
            return Ok(PasswordCheck::Failed);
        };

        if let Some(remaining) = account.lockout.remaining_at(now) {
            tracing::debug!(
                target: TRACING_TARGET,
                account_id = %account.id,
                remaining_secs = remaining.as_secs(),
                "Login attempt while locked out",
            );
            return Ok(PasswordCheck::LockedOut);
        }

        if options.require_confirmed_email && !account.email_confirmed {
            tracing::debug!(
                target: TRACING_TARGET,
                account_id = %account.id,
                "Login attempt with unconfirmed email",
            );
            return Ok(PasswordCheck::Failed);
        }

        let password_matches = self.inner.hasher.verify_password(password, &password_hash)?;

        let mut accounts = self.inner.accounts.write().await;
        let Some(stored) = accounts.get_mut(&key) else {
            return Ok(PasswordCheck::Failed);
        };
        let lockout = &mut stored.account.lockout;

        // A concurrent attempt may have locked the account during hashing.
        if lockout.is_locked_at(now) {
            return Ok(PasswordCheck::LockedOut);
        }

        if password_matches {
            *lockout = LockoutState::default();
            return Ok(PasswordCheck::Success(stored.account.clone()));
        }

        if !options.lockout.is_enabled() {
            return Ok(PasswordCheck::Failed);
        }

        lockout.failed_attempts += 1;
        if lockout.failed_attempts < options.lockout.max_failed_attempts {
            tracing::debug!(
                target: TRACING_TARGET,
                account_id = %stored.account.id,
                failed_attempts = lockout.failed_attempts,
                "Incorrect password",
            );
            return Ok(PasswordCheck::Failed);
        }

        let locked_until = options.lockout.lock_until(now);
        lockout.failed_attempts = 0;
        lockout.locked_until = Some(locked_until);

        tracing::warn!(
            target: TRACING_TARGET,
            account_id = %stored.account.id,
            locked_until = %locked_until,
            "Account locked after repeated failed logins",
        );

        Ok(PasswordCheck::LockedOut)
    }

    async fn get_claims(&self, account: &Account) -> Result<ClaimSet> {
        self.stored_account(account, |stored| stored.claims.clone())
            .await
    }

    async fn get_roles(&self, account: &Account) -> Result<Vec<String>> {
        self.stored_account(account, |stored| stored.roles.clone())
            .await
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn duplicate_email_message(email: &str) -> String {
    format!("Email '{}' is already taken.", email.trim())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn store_with(options: StoreOptions) -> MemoryAccountStore {
        MemoryAccountStore::with_hasher(options, PasswordHasher::for_testing())
    }

    fn store() -> MemoryAccountStore {
        store_with(StoreOptions::default())
    }

    #[tokio::test]
    async fn create_account_returns_confirmed_account() -> anyhow::Result<()> {
        let store = store();
        let account = store.create_account("Alice@Example.com", "secret1").await?;

        assert_eq!(account.email, "Alice@Example.com");
        assert!(account.email_confirmed);
        assert_eq!(store.len().await, 1);
        assert!(store.find_by_email("alice@example.com").await.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_ignoring_case() -> anyhow::Result<()> {
        let store = store();
        store.create_account("alice@example.com", "secret1").await?;

        let error = store
            .create_account(" ALICE@example.com ", "secret1")
            .await
            .unwrap_err();
        match error {
            StoreError::Rejected(errors) => {
                assert_eq!(errors, ["Email 'ALICE@example.com' is already taken."]);
            }
            StoreError::Unavailable(e) => panic!("unexpected store failure: {e}"),
        }
        assert_eq!(store.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn every_broken_rule_is_reported() {
        let store = store_with(StoreOptions {
            password_rules: PasswordRules {
                required_length: 6,
                require_digit: true,
                require_lowercase: true,
                require_uppercase: true,
                require_non_alphanumeric: true,
            },
            ..Default::default()
        });

        let Err(StoreError::Rejected(errors)) = store.create_account("bob@example.com", "abc").await
        else {
            panic!("weak password was accepted");
        };

        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&"Passwords must be at least 6 characters.".to_owned()));
        assert!(errors.iter().any(|e| e.contains("digit")));
        assert!(errors.iter().any(|e| e.contains("uppercase")));
        assert!(errors.iter().any(|e| e.contains("non alphanumeric")));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn correct_password_succeeds() -> anyhow::Result<()> {
        let store = store();
        let created = store.create_account("alice@example.com", "secret1").await?;

        let check = store.verify_password("ALICE@example.com", "secret1").await?;
        assert_eq!(check, PasswordCheck::Success(created));
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_both_fail() -> anyhow::Result<()> {
        let store = store();
        store.create_account("alice@example.com", "secret1").await?;

        let wrong = store.verify_password("alice@example.com", "nope123").await?;
        let unknown = store.verify_password("ghost@example.com", "secret1").await?;
        assert_eq!(wrong, PasswordCheck::Failed);
        assert_eq!(unknown, PasswordCheck::Failed);
        Ok(())
    }

    #[tokio::test]
    async fn fifth_failure_locks_account() -> anyhow::Result<()> {
        let store = store();
        store.create_account("alice@example.com", "secret1").await?;

        for _ in 0..4 {
            let check = store.verify_password("alice@example.com", "wrong1").await?;
            assert_eq!(check, PasswordCheck::Failed);
        }
        let check = store.verify_password("alice@example.com", "wrong1").await?;
        assert_eq!(check, PasswordCheck::LockedOut);

        // The right password does not get through while locked.
        let check = store.verify_password("alice@example.com", "secret1").await?;
        assert_eq!(check, PasswordCheck::LockedOut);

        let account = store.find_by_email("alice@example.com").await.unwrap();
        assert!(account.lockout.is_locked_at(Timestamp::now()));
        assert_eq!(account.lockout.failed_attempts, 0);
        Ok(())
    }

    #[tokio::test]
    async fn oversized_lock_window_still_locks() -> anyhow::Result<()> {
        let store = store_with(StoreOptions {
            lockout: LockoutPolicy {
                max_failed_attempts: 5,
                lockout_duration: SignedDuration::from_mins(10_000_000_000),
            },
            ..Default::default()
        });
        store.create_account("alice@example.com", "secret1").await?;

        for _ in 0..4 {
            let check = store.verify_password("alice@example.com", "wrong1").await?;
            assert_eq!(check, PasswordCheck::Failed);
        }
        for _ in 0..3 {
            let check = store.verify_password("alice@example.com", "wrong1").await?;
            assert_eq!(check, PasswordCheck::LockedOut);
        }

        let check = store.verify_password("alice@example.com", "secret1").await?;
        assert_eq!(check, PasswordCheck::LockedOut);

        let account = store.find_by_email("alice@example.com").await.unwrap();
        assert_eq!(account.lockout.locked_until, Some(Timestamp::MAX));
        assert_eq!(account.lockout.failed_attempts, 0);
        Ok(())
    }

    #[test]
    fn lockout_policy_bounds() {
        assert!(LockoutPolicy::default().validate().is_ok());
        assert!(LockoutPolicy::disabled().validate().is_ok());

        let at_limit = LockoutPolicy {
            lockout_duration: LockoutPolicy::MAX_DURATION,
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());

        let too_long = LockoutPolicy {
            lockout_duration: SignedDuration::from_mins(10_000_000_000),
            ..Default::default()
        };
        assert!(too_long.validate().is_err());

        let negative = LockoutPolicy {
            lockout_duration: SignedDuration::from_mins(-1),
            ..Default::default()
        };
        assert!(negative.validate().is_err());
    }

    #[tokio::test]
    async fn success_resets_failure_counter() -> anyhow::Result<()> {
        let store = store();
        store.create_account("alice@example.com", "secret1").await?;

        for _ in 0..4 {
            store.verify_password("alice@example.com", "wrong1").await?;
        }
        let check = store.verify_password("alice@example.com", "secret1").await?;
        assert!(matches!(check, PasswordCheck::Success(_)));

        let check = store.verify_password("alice@example.com", "wrong1").await?;
        assert_eq!(check, PasswordCheck::Failed);
        let account = store.find_by_email("alice@example.com").await.unwrap();
        assert_eq!(account.lockout.failed_attempts, 1);
        Ok(())
    }

    #[tokio::test]
    async fn lock_lifts_after_window() -> anyhow::Result<()> {
        let store = store_with(StoreOptions {
            lockout: LockoutPolicy {
                max_failed_attempts: 2,
                lockout_duration: SignedDuration::from_millis(300),
            },
            ..Default::default()
        });
        store.create_account("alice@example.com", "secret1").await?;

        store.verify_password("alice@example.com", "wrong1").await?;
        let check = store.verify_password("alice@example.com", "wrong1").await?;
        assert_eq!(check, PasswordCheck::LockedOut);

        tokio::time::sleep(Duration::from_millis(400)).await;
        let check = store.verify_password("alice@example.com", "secret1").await?;
        assert!(matches!(check, PasswordCheck::Success(_)));
        Ok(())
    }

    #[tokio::test]
    async fn disabled_lockout_never_locks() -> anyhow::Result<()> {
        let store = store_with(StoreOptions {
            lockout: LockoutPolicy::disabled(),
            ..Default::default()
        });
        store.create_account("alice@example.com", "secret1").await?;

        for _ in 0..10 {
            let check = store.verify_password("alice@example.com", "wrong1").await?;
            assert_eq!(check, PasswordCheck::Failed);
        }
        Ok(())
    }

    #[tokio::test]
    async fn unlock_clears_lock() -> anyhow::Result<()> {
        let store = store();
        store.create_account("alice@example.com", "secret1").await?;
        for _ in 0..5 {
            store.verify_password("alice@example.com", "wrong1").await?;
        }

        store.unlock("alice@example.com").await?;
        let check = store.verify_password("alice@example.com", "secret1").await?;
        assert!(matches!(check, PasswordCheck::Success(_)));
        Ok(())
    }

    #[tokio::test]
    async fn unconfirmed_email_fails_when_required() -> anyhow::Result<()> {
        let store = store_with(StoreOptions {
            require_confirmed_email: true,
            ..Default::default()
        });
        store.create_account("alice@example.com", "secret1").await?;
        store.set_email_confirmed("alice@example.com", false).await?;

        let check = store.verify_password("alice@example.com", "secret1").await?;
        assert_eq!(check, PasswordCheck::Failed);

        store.confirm_email("alice@example.com").await?;
        let check = store.verify_password("alice@example.com", "secret1").await?;
        assert!(matches!(check, PasswordCheck::Success(_)));
        Ok(())
    }

    #[tokio::test]
    async fn roles_and_claims_come_from_the_store() -> anyhow::Result<()> {
        let store = store();
        let account = store.create_account("alice@example.com", "secret1").await?;

        store.add_to_role("alice@example.com", "admin").await?;
        store.add_to_role("alice@example.com", "billing").await?;
        store.add_to_role("alice@example.com", "admin").await?;
        store
            .add_claim("alice@example.com", Claim::new("department", "finance"))
            .await?;

        // The snapshot taken at creation is stale; lookups read current state.
        assert_eq!(store.get_roles(&account).await?, ["admin", "billing"]);
        let claims = store.get_claims(&account).await?;
        assert_eq!(claims.len(), 1);
        assert_eq!(claims.first("department").unwrap().value(), "finance");
        Ok(())
    }

    #[tokio::test]
    async fn lookups_for_unknown_account_fail() {
        let store = store();
        let stranger = Account::new("ghost@example.com");

        let error = store.get_roles(&stranger).await.unwrap_err();
        assert_eq!(error.kind(), crate::ErrorKind::Store);
        assert!(store.add_to_role("ghost@example.com", "admin").await.is_err());
    }
}
