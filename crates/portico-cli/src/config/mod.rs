//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── server: ServerConfig    # Host, port, timeouts
//! ├── service: ServiceConfig  # Token signing, lockout
//! └── log_format: LogFormat   # text | json
//! ```
//!
//! Every option can be given as a flag or an environment variable.

mod server;

use std::process;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use portico_server::service::ServiceConfig;
use serde::{Deserialize, Serialize};
pub use server::ServerConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// Output format of the log subscriber.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "portico")]
#[command(about = "Portico identity server")]
#[command(version)]
pub struct Cli {
    /// Server network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// Token signing and account lockout configuration.
    #[clap(flatten)]
    pub service: ServiceConfig,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Loads a `.env` file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with `RUST_LOG` filtering, defaulting to `info`.
    pub fn init_tracing(format: LogFormat) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let registry = tracing_subscriber::registry().with(filter);

        match format {
            LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
            LogFormat::Json => registry
                .with(tracing_subscriber::fmt::layer().json())
                .init(),
        }
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;
        Ok(())
    }

    /// Logs configuration at startup. The signing secret is never logged.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            "Starting portico server"
        );

        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        self.server.log();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            issuer = %self.service.signing.issuer,
            audience = %self.service.signing.audience,
            expiration_hours = self.service.signing.expiration_hours,
            lockout_max_attempts = self.service.lockout_max_attempts,
            lockout_minutes = self.service.lockout_minutes,
            require_confirmed_email = self.service.require_confirmed_email,
            "Identity configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_defaults() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["portico", "--jwt-secret", "a-long-signing-secret"])?;

        assert_eq!(cli.server.port, 3000);
        assert_eq!(cli.log_format, LogFormat::Text);
        assert_eq!(cli.service.signing.issuer, "portico");
        assert_eq!(cli.service.signing.audience, "portico:api");
        assert_eq!(cli.service.signing.expiration_hours, 2);
        assert_eq!(cli.service.lockout_max_attempts, 5);
        assert!(cli.validate().is_ok());
        Ok(())
    }

    #[test]
    fn parses_overrides() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "portico",
            "--jwt-secret",
            "a-long-signing-secret",
            "--port",
            "8080",
            "--jwt-expiration-hours",
            "6",
            "--log-format",
            "json",
        ])?;

        assert_eq!(cli.server.port, 8080);
        assert_eq!(cli.service.signing.expiration_hours, 6);
        assert_eq!(cli.log_format, LogFormat::Json);
        Ok(())
    }

    #[test]
    fn rejects_privileged_port() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "portico",
            "--jwt-secret",
            "a-long-signing-secret",
            "--port",
            "80",
        ])?;
        assert!(cli.validate().is_err());
        Ok(())
    }
}
