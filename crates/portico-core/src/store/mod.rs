//! Account storage.
//!
//! [`AccountStore`] is the seam between the identity core and whatever keeps
//! accounts. It owns password hashing, password rules, lockout bookkeeping,
//! roles and custom claims. [`MemoryAccountStore`] is the in-process
//! reference implementation.

mod hasher;
mod memory;

use async_trait::async_trait;

pub use self::hasher::PasswordHasher;
pub use self::memory::{LockoutPolicy, MemoryAccountStore, PasswordRules, StoreOptions};
use crate::Error;
use crate::types::{Account, ClaimSet};

/// Outcome of checking a password against a stored account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordCheck {
    /// The password matched and the account may sign in.
    Success(Account),
    /// The account is inside a lock window.
    LockedOut,
    /// Unknown email, wrong password or not allowed to sign in.
    Failed,
}

/// Failure of an account creation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store refused the account; messages are safe to show the caller.
    #[error("account rejected: {}", .0.join("; "))]
    Rejected(Vec<String>),
    /// The store could not be reached or failed internally.
    #[error(transparent)]
    Unavailable(#[from] Error),
}

/// Persistence and credential checks for accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Creates an account, hashing `password` and applying password rules.
    async fn create_account(&self, email: &str, password: &str) -> Result<Account, StoreError>;

    /// Checks a password and updates the failed-attempt counter and lock.
    async fn verify_password(&self, email: &str, password: &str) -> crate::Result<PasswordCheck>;

    /// Returns the custom claims currently stored for `account`.
    async fn get_claims(&self, account: &Account) -> crate::Result<ClaimSet>;

    /// Returns the role names of `account` in store order.
    async fn get_roles(&self, account: &Account) -> crate::Result<Vec<String>>;
}
