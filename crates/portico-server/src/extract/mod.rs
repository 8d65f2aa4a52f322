//! Request extractors whose rejections render as the error envelope.
//!
//! - [`Json`]: JSON body extraction; malformed bodies become 400 responses.
//! - [`AuthClaims`]: verified bearer token; failures become 401 responses.

mod auth;
mod json;

pub use crate::extract::auth::AuthClaims;
pub use crate::extract::json::Json;
