use portico_core::token::DecodedToken;
use portico_core::types::ClaimSet;
use serde::{Deserialize, Serialize};

/// Verified contents of a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenIntrospection {
    /// Subject (account id).
    pub subject: Option<String>,
    /// Token id.
    pub token_id: Option<String>,
    /// Issued-at, epoch seconds.
    pub issued_at: Option<i64>,
    /// Expiration, epoch seconds.
    pub expires_at: Option<i64>,
    /// Every claim in the payload, arrays expanded.
    pub claims: ClaimSet,
}

impl From<&DecodedToken> for TokenIntrospection {
    fn from(token: &DecodedToken) -> Self {
        Self {
            subject: token.subject().map(str::to_owned),
            token_id: token.token_id().map(str::to_owned),
            issued_at: token.issued_at(),
            expires_at: token.expires_at(),
            claims: token.to_claim_set(),
        }
    }
}
