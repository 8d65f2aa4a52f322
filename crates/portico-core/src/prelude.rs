//! Commonly used items from the identity core.

pub use crate::claims::ClaimsAssembler;
pub use crate::credential::{CredentialValidator, LoginOutcome};
pub use crate::flow::{AuthError, AuthErrorKind, AuthenticationFlow};
pub use crate::store::{AccountStore, MemoryAccountStore, PasswordCheck, StoreError};
pub use crate::token::{DecodedToken, SigningConfig, TokenEncoder};
pub use crate::types::{Account, Claim, ClaimSet, ClaimValueKind, TokenResponse, UserSummary};
pub use crate::validation::{FieldError, LoginRequest, RegisterRequest, validate_input};
pub use crate::{Error, ErrorKind, Result};
