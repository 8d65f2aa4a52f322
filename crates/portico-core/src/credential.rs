//! Credential checks on top of an [`AccountStore`].

use std::sync::Arc;

use crate::store::{AccountStore, PasswordCheck, StoreError};
use crate::types::Account;
use crate::validation::{LoginRequest, RegisterRequest};

/// Tracing target for credential validation.
const TRACING_TARGET: &str = "portico_core::credential";

/// Shown when a login attempt hits a locked account.
pub const LOCKED_OUT_MESSAGE: &str = "account temporarily locked due to invalid attempts";

/// Shown for every other failed login.
pub const LOGIN_FAILED_MESSAGE: &str = "incorrect email or password";

/// Shown when the store fails during registration.
pub const REGISTRATION_UNAVAILABLE_MESSAGE: &str =
    "registration is temporarily unavailable, please try again later";

/// Result of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success(Account),
    LockedOut,
    Failed,
}

impl LoginOutcome {
    /// Returns the user-facing message of a failed outcome.
    pub fn failure_message(&self) -> Option<&'static str> {
        match self {
            Self::Success(_) => None,
            Self::LockedOut => Some(LOCKED_OUT_MESSAGE),
            Self::Failed => Some(LOGIN_FAILED_MESSAGE),
        }
    }
}

/// Registers accounts and checks login credentials.
///
/// Counting failures and locking accounts is left to the store; this only
/// reports what the store decided.
#[derive(Clone)]
pub struct CredentialValidator {
    store: Arc<dyn AccountStore>,
}

impl CredentialValidator {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Creates the account described by an already validated `request`.
    ///
    /// Store rule violations come back verbatim, one message per rule.
    pub async fn register(&self, request: &RegisterRequest) -> Result<Account, Vec<String>> {
        match self
            .store
            .create_account(&request.email, &request.password)
            .await
        {
            Ok(account) => {
                tracing::info!(
                    target: TRACING_TARGET,
                    account_id = %account.id,
                    "Account registered",
                );
                Ok(account)
            }
            Err(StoreError::Rejected(errors)) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error_count = errors.len(),
                    "Registration rejected by account store",
                );
                Err(errors)
            }
            Err(StoreError::Unavailable(e)) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %e,
                    "Account store failed during registration",
                );
                Err(vec![REGISTRATION_UNAVAILABLE_MESSAGE.to_owned()])
            }
        }
    }

    /// Checks the credentials of an already validated `request`.
    pub async fn login(&self, request: &LoginRequest) -> LoginOutcome {
        match self
            .store
            .verify_password(&request.email, &request.password)
            .await
        {
            Ok(PasswordCheck::Success(account)) => {
                tracing::info!(
                    target: TRACING_TARGET,
                    account_id = %account.id,
                    "Credentials accepted",
                );
                LoginOutcome::Success(account)
            }
            Ok(PasswordCheck::LockedOut) => {
                tracing::warn!(target: TRACING_TARGET, "Login refused: account locked out");
                LoginOutcome::LockedOut
            }
            Ok(PasswordCheck::Failed) => {
                tracing::warn!(target: TRACING_TARGET, "Login refused: invalid credentials");
                LoginOutcome::Failed
            }
            Err(e) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %e,
                    "Account store failed during login",
                );
                LoginOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::store::{MemoryAccountStore, PasswordHasher, StoreOptions};
    use crate::types::ClaimSet;
    use crate::{Error, Result};

    struct BrokenStore;

    #[async_trait]
    impl AccountStore for BrokenStore {
        async fn create_account(&self, _: &str, _: &str) -> Result<Account, StoreError> {
            Err(Error::store("connection refused").into())
        }

        async fn verify_password(&self, _: &str, _: &str) -> Result<PasswordCheck> {
            Err(Error::store("connection refused"))
        }

        async fn get_claims(&self, _: &Account) -> Result<ClaimSet> {
            Err(Error::store("connection refused"))
        }

        async fn get_roles(&self, _: &Account) -> Result<Vec<String>> {
            Err(Error::store("connection refused"))
        }
    }

    fn validator() -> CredentialValidator {
        let store =
            MemoryAccountStore::with_hasher(StoreOptions::default(), PasswordHasher::for_testing());
        CredentialValidator::new(Arc::new(store))
    }

    #[tokio::test]
    async fn register_then_login() -> anyhow::Result<()> {
        let validator = validator();
        let account = validator
            .register(&RegisterRequest::new("a@b.com", "secret1", "secret1"))
            .await
            .map_err(|errors| anyhow::anyhow!("{errors:?}"))?;

        let outcome = validator.login(&LoginRequest::new("a@b.com", "secret1")).await;
        assert_eq!(outcome, LoginOutcome::Success(account));
        assert_eq!(outcome.failure_message(), None);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_registration_passes_store_messages_through() -> anyhow::Result<()> {
        let validator = validator();
        let request = RegisterRequest::new("a@b.com", "secret1", "secret1");
        validator
            .register(&request)
            .await
            .map_err(|errors| anyhow::anyhow!("{errors:?}"))?;

        let errors = validator.register(&request).await.unwrap_err();
        assert_eq!(errors, ["Email 'a@b.com' is already taken."]);
        Ok(())
    }

    #[tokio::test]
    async fn lockout_has_its_own_message() {
        let validator = validator();
        validator
            .register(&RegisterRequest::new("a@b.com", "secret1", "secret1"))
            .await
            .unwrap();

        let wrong = LoginRequest::new("a@b.com", "wrong12");
        for _ in 0..4 {
            assert_eq!(validator.login(&wrong).await, LoginOutcome::Failed);
        }
        let outcome = validator.login(&wrong).await;
        assert_eq!(outcome, LoginOutcome::LockedOut);
        assert_eq!(outcome.failure_message(), Some(LOCKED_OUT_MESSAGE));
        assert_eq!(LoginOutcome::Failed.failure_message(), Some(LOGIN_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn store_faults_are_contained() {
        let validator = CredentialValidator::new(Arc::new(BrokenStore));

        let outcome = validator.login(&LoginRequest::new("a@b.com", "secret1")).await;
        assert_eq!(outcome, LoginOutcome::Failed);

        let errors = validator
            .register(&RegisterRequest::new("a@b.com", "secret1", "secret1"))
            .await
            .unwrap_err();
        assert_eq!(errors, [REGISTRATION_UNAVAILABLE_MESSAGE]);
    }
}
