//! Successful authentication responses.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Account, ClaimSet};

/// The result of a successful registration or login.
///
/// Only the authentication flow builds one, so a response always carries a
/// token signed with the configured key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    access_token: String,
    expires_in: u64,
    user: UserSummary,
}

impl TokenResponse {
    pub(crate) fn new(access_token: String, expires_in: u64, user: UserSummary) -> Self {
        Self {
            access_token,
            expires_in,
            user,
        }
    }

    /// Returns the compact signed token.
    #[inline]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the token lifetime in seconds.
    #[inline]
    pub fn expires_in(&self) -> u64 {
        self.expires_in
    }

    #[inline]
    pub fn user(&self) -> &UserSummary {
        &self.user
    }
}

/// Public view of the authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    id: Uuid,
    email: String,
    claims: ClaimSet,
}

impl UserSummary {
    pub(crate) fn new(account: &Account, claims: ClaimSet) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            claims,
        }
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the claims that were placed in the token.
    #[inline]
    pub fn claims(&self) -> &ClaimSet {
        &self.claims
    }
}
