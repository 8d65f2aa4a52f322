//! Argon2id password hashing and verification.

use std::sync::{Arc, OnceLock};

use argon2::password_hash::{Error as ArgonError, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier, Version};
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::{Rng, thread_rng};

use crate::{Error, Result};

/// Tracing target for password hashing.
const TRACING_TARGET: &str = "portico_core::store::hasher";

/// Password hashing service using Argon2id.
///
/// Hashes are PHC strings carrying the algorithm, parameters and salt, so
/// they can be stored as-is.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    dummy_hash: Arc<OnceLock<String>>,
}

impl PasswordHasher {
    /// Creates a hasher with the default Argon2id parameters.
    pub fn new() -> Self {
        Self::from_argon2(Argon2::default())
    }

    /// Creates a hasher with explicit Argon2id parameters.
    pub fn with_params(params: Params) -> Self {
        Self::from_argon2(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Creates a hasher with minimal cost parameters for tests and local runs.
    pub fn for_testing() -> Self {
        Params::new(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST, None)
            .map(Self::with_params)
            .unwrap_or_default()
    }

    fn from_argon2(argon2: Argon2<'static>) -> Self {
        Self {
            argon2,
            dummy_hash: Arc::new(OnceLock::new()),
        }
    }

    /// Hashes `password` with a fresh random salt.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %e,
                    "Password hashing operation failed",
                );

                Error::internal("password hashing failed").with_source(e)
            })?;

        Ok(password_hash.to_string())
    }

    /// Checks `password` against a stored PHC hash.
    ///
    /// A mismatch is `Ok(false)`; only a malformed hash or an Argon2 failure
    /// is an error.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(stored_hash).map_err(|e| {
            tracing::warn!(
                target: TRACING_TARGET,
                error = %e,
                "Invalid password hash format",
            );

            Error::internal("stored password hash is malformed").with_source(e)
        })?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(ArgonError::Password) => Ok(false),
            Err(e) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %e,
                    "Password verification system error",
                );

                Err(Error::internal("password verification failed").with_source(e))
            }
        }
    }

    /// Burns the same work as a real verification and always returns `false`.
    ///
    /// Used for unknown accounts so response time does not reveal which
    /// emails are registered.
    pub fn verify_dummy_password(&self, password: &str) -> bool {
        let dummy_hash = self.dummy_hash.get_or_init(|| {
            let dummy_password: String = thread_rng()
                .sample_iter(&Alphanumeric)
                .take(24)
                .map(char::from)
                .collect();
            self.hash_password(&dummy_password).unwrap_or_default()
        });

        if !dummy_hash.is_empty() {
            let _ = self.verify_password(password, dummy_hash);
        }

        false
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_password() -> anyhow::Result<()> {
        let hasher = PasswordHasher::for_testing();
        let hash = hasher.hash_password("secure_password_123")?;

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify_password("secure_password_123", &hash)?);
        assert!(!hasher.verify_password("wrong_password", &hash)?);

        Ok(())
    }

    #[test]
    fn hash_produces_unique_salts() -> anyhow::Result<()> {
        let hasher = PasswordHasher::for_testing();

        let hash1 = hasher.hash_password("test_password")?;
        let hash2 = hasher.hash_password("test_password")?;

        assert_ne!(hash1, hash2);
        assert!(hasher.verify_password("test_password", &hash1)?);
        assert!(hasher.verify_password("test_password", &hash2)?);

        Ok(())
    }

    #[test]
    fn verify_password_errors_on_malformed_hash() {
        let hasher = PasswordHasher::for_testing();
        let error = hasher
            .verify_password("test_password", "invalid_hash_format")
            .unwrap_err();
        assert_eq!(error.kind(), crate::ErrorKind::Internal);
    }

    #[test]
    fn default_hasher_verifies_test_hashes() -> anyhow::Result<()> {
        // Parameters travel inside the PHC string.
        let hash = PasswordHasher::for_testing().hash_password("portable")?;
        assert!(PasswordHasher::new().verify_password("portable", &hash)?);
        Ok(())
    }

    #[test]
    fn dummy_verification_never_succeeds() {
        let hasher = PasswordHasher::for_testing();
        assert!(!hasher.verify_dummy_password("anything"));
        assert!(!hasher.verify_dummy_password(""));
    }
}
