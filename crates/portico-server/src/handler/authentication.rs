//! Registration and login handlers.

use axum::Router;
use axum::extract::State;
use axum::routing::post;
use portico_core::flow::AuthenticationFlow;
use portico_core::validation::{LoginRequest, RegisterRequest};

use crate::extract::Json;
use crate::handler::response::TokenResponse;
use crate::handler::{Result, TRACING_TARGET};
use crate::service::ServiceState;

/// Creates an account and returns a token for it.
#[tracing::instrument(skip_all)]
async fn register(
    State(flow): State<AuthenticationFlow>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<TokenResponse>> {
    tracing::trace!(target: TRACING_TARGET, "Registration requested");

    let response = flow.register(request).await.inspect_err(|error| {
        tracing::warn!(
            target: TRACING_TARGET,
            kind = %error.kind(),
            "Registration failed",
        );
    })?;

    tracing::info!(
        target: TRACING_TARGET,
        account_id = %response.user().id(),
        "Account registered",
    );

    Ok(Json(response))
}

/// Checks credentials and returns a token.
#[tracing::instrument(skip_all)]
async fn authenticate(
    State(flow): State<AuthenticationFlow>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    tracing::trace!(target: TRACING_TARGET, "Authentication requested");

    let response = flow.authenticate(request).await.inspect_err(|error| {
        tracing::warn!(
            target: TRACING_TARGET,
            kind = %error.kind(),
            "Authentication failed",
        );
    })?;

    tracing::info!(
        target: TRACING_TARGET,
        account_id = %response.user().id(),
        "Account authenticated",
    );

    Ok(Json(response))
}

/// Returns a [`Router`] with registration and login routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/api/identity/register", post(register))
        .route("/api/identity/authenticate", post(authenticate))
}
