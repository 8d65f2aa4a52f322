#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;

use std::process;

use anyhow::Context;
use axum::Router;
use portico_server::handler::routes;
use portico_server::middleware::{RecoveryConfig, RouterObservabilityExt, RouterRecoveryExt};
use portico_server::service::{ServiceConfig, ServiceState};

use crate::config::{Cli, ServerConfig};

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "portico_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "portico_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "portico_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "Application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = format!("{error:#}"),
            "Application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing(cli.log_format);
    cli.log();
    cli.validate()?;

    let state = create_service_state(&cli.service)?;
    let router = create_router(state, &cli.server);

    server::serve(router, cli.server).await?;

    Ok(())
}

/// Creates the service state from configuration.
fn create_service_state(config: &ServiceConfig) -> anyhow::Result<ServiceState> {
    ServiceState::from_config(config).context("failed to create service state")
}

/// Creates the router with all middleware layers applied.
///
/// Recovery is outermost so that it also covers the observability layers.
fn create_router(state: ServiceState, server: &ServerConfig) -> Router {
    let recovery = RecoveryConfig::with_timeout_secs(server.request_timeout);

    routes()
        .with_state(state)
        .with_observability()
        .with_recovery(&recovery)
}
