//! Registration and login pipelines.
//!
//! [`AuthenticationFlow`] validates input, asks the [`CredentialValidator`]
//! to register or check the account, and on success assembles claims and
//! signs a token. Every failure comes back as an [`AuthError`] whose
//! messages are safe to show the caller; nothing else escapes.

use std::fmt;
use std::sync::Arc;

use jiff::Timestamp;
use serde::Serialize;

use crate::claims::ClaimsAssembler;
use crate::credential::{CredentialValidator, LOCKED_OUT_MESSAGE, LOGIN_FAILED_MESSAGE, LoginOutcome};
use crate::store::AccountStore;
use crate::token::TokenEncoder;
use crate::types::{Account, TokenResponse, UserSummary};
use crate::validation::{FieldError, LoginRequest, RegisterRequest, validate_input};

/// Tracing target for the authentication flow.
const TRACING_TARGET: &str = "portico_core::flow";

/// Shown when the account was created but no token could be issued.
pub const REGISTRATION_INCOMPLETE_MESSAGE: &str =
    "account created but sign-in failed, please authenticate";

/// Category of a failed registration or login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    /// Input failed field rules; the store was not consulted.
    Validation,
    /// The store refused the new account.
    RegistrationFailed,
    /// Wrong credentials, unknown account or an internal fault.
    AuthenticationFailed,
    /// The account is inside a lock window.
    LockedOut,
}

impl AuthErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::RegistrationFailed => "registration_failed",
            Self::AuthenticationFailed => "authentication_failed",
            Self::LockedOut => "locked_out",
        }
    }
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed registration or login with caller-facing messages.
///
/// Serializes as the failure envelope `{"errors": [..]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind}: {}", .errors.join("; "))]
pub struct AuthError {
    #[serde(skip)]
    kind: AuthErrorKind,
    errors: Vec<String>,
}

impl AuthError {
    fn new(kind: AuthErrorKind, errors: Vec<String>) -> Self {
        Self { kind, errors }
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        let errors = errors.into_iter().map(|error| error.message).collect();
        Self::new(AuthErrorKind::Validation, errors)
    }

    pub fn registration_failed(errors: Vec<String>) -> Self {
        Self::new(AuthErrorKind::RegistrationFailed, errors)
    }

    pub fn authentication_failed() -> Self {
        Self::new(
            AuthErrorKind::AuthenticationFailed,
            vec![LOGIN_FAILED_MESSAGE.to_owned()],
        )
    }

    pub fn locked_out() -> Self {
        Self::new(AuthErrorKind::LockedOut, vec![LOCKED_OUT_MESSAGE.to_owned()])
    }

    #[inline]
    pub fn kind(&self) -> AuthErrorKind {
        self.kind
    }

    #[inline]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}

/// Orchestrates registration and login.
#[derive(Clone)]
pub struct AuthenticationFlow {
    credentials: CredentialValidator,
    assembler: ClaimsAssembler,
    encoder: TokenEncoder,
}

impl AuthenticationFlow {
    pub fn new(store: Arc<dyn AccountStore>, encoder: TokenEncoder) -> Self {
        Self {
            credentials: CredentialValidator::new(store.clone()),
            assembler: ClaimsAssembler::new(store),
            encoder,
        }
    }

    #[inline]
    pub fn encoder(&self) -> &TokenEncoder {
        &self.encoder
    }

    /// Validates input, creates the account and signs it in.
    pub async fn register(&self, request: RegisterRequest) -> Result<TokenResponse, AuthError> {
        validate_input(&request).map_err(AuthError::validation)?;

        let account = self
            .credentials
            .register(&request)
            .await
            .map_err(AuthError::registration_failed)?;

        self.issue(&account).await.map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET,
                account_id = %account.id,
                error = %e,
                "Token issuance failed after registration",
            );
            AuthError::registration_failed(vec![REGISTRATION_INCOMPLETE_MESSAGE.to_owned()])
        })
    }

    /// Validates input, checks credentials and issues a token.
    pub async fn authenticate(&self, request: LoginRequest) -> Result<TokenResponse, AuthError> {
        validate_input(&request).map_err(AuthError::validation)?;

        let account = match self.credentials.login(&request).await {
            LoginOutcome::Success(account) => account,
            LoginOutcome::LockedOut => return Err(AuthError::locked_out()),
            LoginOutcome::Failed => return Err(AuthError::authentication_failed()),
        };

        self.issue(&account).await.map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET,
                account_id = %account.id,
                error = %e,
                "Token issuance failed after login",
            );
            AuthError::authentication_failed()
        })
    }

    async fn issue(&self, account: &Account) -> crate::Result<TokenResponse> {
        let now = Timestamp::now();
        let claims = self.assembler.assemble_at(account, now).await?;
        let access_token = self.encoder.encode(&claims, now)?;

        tracing::info!(
            target: TRACING_TARGET,
            account_id = %account.id,
            expires_in = self.encoder.expires_in(),
            "Access token issued",
        );

        Ok(TokenResponse::new(
            access_token,
            self.encoder.expires_in(),
            UserSummary::new(account, claims),
        ))
    }
}
