//! Bearer token introspection.

use axum::Router;
use axum::routing::get;

use crate::extract::{AuthClaims, Json};
use crate::handler::TRACING_TARGET;
use crate::handler::response::TokenIntrospection;
use crate::service::ServiceState;

/// Returns the verified claims of the caller's bearer token.
async fn introspect(AuthClaims(token): AuthClaims) -> Json<TokenIntrospection> {
    tracing::debug!(
        target: TRACING_TARGET,
        subject = token.subject().unwrap_or_default(),
        "Token introspected",
    );

    Json(TokenIntrospection::from(&token))
}

/// Returns a [`Router`] with the token introspection route.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/api/identity/token", get(introspect))
}
