//! Response bodies returned by handlers.

mod errors;
mod tokens;

pub use errors::ErrorResponse;
pub use portico_core::types::{TokenResponse, UserSummary};
pub use tokens::TokenIntrospection;
