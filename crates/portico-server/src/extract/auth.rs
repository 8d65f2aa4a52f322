//! Bearer token extraction and verification.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use derive_more::Deref;
use portico_core::token::{DecodedToken, TokenEncoder};

use crate::handler::{Error, ErrorKind};

/// Tracing target for bearer authentication.
const TRACING_TARGET: &str = "portico_server::extract::auth";

/// Verified claims of the request's `Authorization: Bearer` token.
///
/// Rejects with 401 when the header is absent or the token fails
/// signature, issuer, audience or lifetime checks.
#[derive(Debug, Clone, Deref)]
pub struct AuthClaims(pub DecodedToken);

impl AuthClaims {
    #[inline]
    pub fn into_inner(self) -> DecodedToken {
        self.0
    }
}

impl<S> FromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
    TokenEncoder: FromRef<S>,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header =
            <TypedHeader<Authorization<Bearer>> as FromRequestParts<S>>::from_request_parts(
                parts, state,
            )
            .await
            .map_err(|rejection| {
                tracing::debug!(
                    target: TRACING_TARGET,
                    reason = %rejection,
                    "Bearer token missing or unreadable",
                );

                if rejection.is_missing() {
                    ErrorKind::MissingAuthToken.into_error()
                } else {
                    ErrorKind::MalformedAuthToken.with_context("unreadable authorization header")
                }
            })?;

        let encoder = TokenEncoder::from_ref(state);
        let token = encoder.decode(header.token()).map_err(|e| {
            tracing::debug!(
                target: TRACING_TARGET,
                error = %e,
                "Bearer token rejected",
            );

            ErrorKind::MalformedAuthToken.with_context(e.message().to_owned())
        })?;

        tracing::trace!(
            target: TRACING_TARGET,
            subject = token.subject().unwrap_or_default(),
            "Bearer token verified",
        );

        Ok(Self(token))
    }
}
