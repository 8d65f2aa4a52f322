//! Data types shared across the identity core.

mod account;
mod claim;
mod response;

pub use account::{Account, LockoutState};
pub use claim::{Claim, ClaimSet, ClaimValueKind, claim_types};
pub use response::{TokenResponse, UserSummary};
