//! Account records as seen by the identity core.

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ClaimSet;

/// An account known to an [`AccountStore`].
///
/// Never carries the password or its hash.
///
/// [`AccountStore`]: crate::store::AccountStore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Stable unique identifier.
    pub id: Uuid,
    /// Email address as registered; doubles as the username.
    pub email: String,
    /// Whether the email address has been confirmed.
    pub email_confirmed: bool,
    /// Role names in store order.
    pub roles: Vec<String>,
    /// Custom claims attached to the account.
    pub claims: ClaimSet,
    /// Failed-attempt bookkeeping.
    pub lockout: LockoutState,
}

impl Account {
    /// Creates a new confirmed account with a time-ordered identifier.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            email: email.into(),
            email_confirmed: true,
            roles: Vec::new(),
            claims: ClaimSet::new(),
            lockout: LockoutState::default(),
        }
    }
}

/// Failed-login counter and lock window of an account.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockoutState {
    /// Consecutive failed attempts since the last success or lock.
    pub failed_attempts: u32,
    /// End of the current lock window, if any.
    pub locked_until: Option<Timestamp>,
}

impl LockoutState {
    /// Returns whether the lock window covers `now`.
    pub fn is_locked_at(&self, now: Timestamp) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    /// Returns how long the lock still holds at `now`.
    pub fn remaining_at(&self, now: Timestamp) -> Option<SignedDuration> {
        self.locked_until
            .filter(|until| *until > now)
            .map(|until| until.duration_since(now))
    }
}
