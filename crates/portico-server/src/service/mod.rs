//! Application state and dependency injection.

mod config;

use std::sync::Arc;

use portico_core::flow::AuthenticationFlow;
use portico_core::store::{AccountStore, MemoryAccountStore};
use portico_core::token::TokenEncoder;

pub use crate::service::config::ServiceConfig;
pub use crate::{Error, Result};

/// Tracing target for service state construction.
const TRACING_TARGET: &str = "portico_server::service";

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    pub flow: AuthenticationFlow,
    pub token_encoder: TokenEncoder,
}

impl ServiceState {
    /// Builds state backed by the in-memory account store.
    ///
    /// Fails when the signing configuration is unusable.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let store = MemoryAccountStore::new(config.store_options()?);
        Self::with_store(config, Arc::new(store))
    }

    /// Builds state on top of an existing account store.
    pub fn with_store(config: &ServiceConfig, store: Arc<dyn AccountStore>) -> Result<Self> {
        let token_encoder = TokenEncoder::new(config.signing.clone())?;
        let flow = AuthenticationFlow::new(store, token_encoder.clone());

        tracing::debug!(target: TRACING_TARGET, "Service state initialized");

        Ok(Self {
            flow,
            token_encoder,
        })
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(flow: AuthenticationFlow);
impl_di!(token_encoder: TokenEncoder);
