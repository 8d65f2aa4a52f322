//! Claim set assembly for authenticated accounts.

use std::sync::Arc;

use jiff::Timestamp;
use uuid::Uuid;

use crate::Result;
use crate::store::AccountStore;
use crate::types::{Account, Claim, ClaimSet, claim_types};

/// Tracing target for claims assembly.
const TRACING_TARGET: &str = "portico_core::claims";

/// Claim types the assembler sets itself; stored claims with these names are dropped.
const ASSEMBLED_CLAIM_TYPES: [&str; 5] = [
    claim_types::SUBJECT,
    claim_types::EMAIL,
    claim_types::TOKEN_ID,
    claim_types::NOT_BEFORE,
    claim_types::ISSUED_AT,
];

/// Builds the ordered claim set placed in an account's token.
///
/// Order: the account's custom claims as stored, then `sub`, `email`,
/// `jti`, `nbf`, `iat`, then one `role` claim per role in store order.
/// A stored claim named like one of the assembled ones is left out.
#[derive(Clone)]
pub struct ClaimsAssembler {
    store: Arc<dyn AccountStore>,
}

impl ClaimsAssembler {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Assembles claims stamped with the current time.
    pub async fn assemble(&self, account: &Account) -> Result<ClaimSet> {
        self.assemble_at(account, Timestamp::now()).await
    }

    /// Assembles claims stamped with `now`.
    pub async fn assemble_at(&self, account: &Account, now: Timestamp) -> Result<ClaimSet> {
        let stored = self.store.get_claims(account).await?;
        let stored_count = stored.len();
        let mut claims: ClaimSet = stored
            .into_iter()
            .filter(|claim| !ASSEMBLED_CLAIM_TYPES.contains(&claim.claim_type()))
            .collect();

        if claims.len() < stored_count {
            tracing::warn!(
                target: TRACING_TARGET,
                account_id = %account.id,
                dropped = stored_count - claims.len(),
                "Stored claims shadowing assembled claims were dropped",
            );
        }

        let roles = self.store.get_roles(account).await?;
        let issued_at = now.as_second();

        claims.push(Claim::new(claim_types::SUBJECT, account.id.to_string()));
        claims.push(Claim::new(claim_types::EMAIL, account.email.as_str()));
        claims.push(Claim::new(claim_types::TOKEN_ID, Uuid::new_v4().to_string()));
        claims.push(Claim::integer(claim_types::NOT_BEFORE, issued_at));
        claims.push(Claim::integer(claim_types::ISSUED_AT, issued_at));
        claims.extend(roles.into_iter().map(|role| Claim::new(claim_types::ROLE, role)));

        tracing::debug!(
            target: TRACING_TARGET,
            account_id = %account.id,
            claim_count = claims.len(),
            "Claims assembled",
        );

        Ok(claims)
    }
}
