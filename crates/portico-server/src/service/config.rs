//! Service configuration.

#[cfg(feature = "config")]
use clap::Args;
use jiff::SignedDuration;
use portico_core::store::{LockoutPolicy, PasswordRules, StoreOptions};
use portico_core::token::SigningConfig;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Token signing and account lockout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct ServiceConfig {
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(flatten)]
    pub signing: SigningConfig,

    /// Consecutive failed logins before an account is locked; 0 disables lockout.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "LOCKOUT_MAX_ATTEMPTS", default_value_t = 5)
    )]
    #[serde(default = "ServiceConfig::default_lockout_max_attempts")]
    pub lockout_max_attempts: u32,

    /// How long a lockout lasts, in minutes.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "LOCKOUT_MINUTES", default_value_t = 5)
    )]
    #[serde(default = "ServiceConfig::default_lockout_minutes")]
    pub lockout_minutes: i64,

    /// Refuse sign-in until the account's email is confirmed.
    #[cfg_attr(feature = "config", arg(long, env = "REQUIRE_CONFIRMED_EMAIL"))]
    #[serde(default)]
    pub require_confirmed_email: bool,
}

impl ServiceConfig {
    /// Creates a configuration with default lockout settings.
    pub fn new(signing: SigningConfig) -> Self {
        Self {
            signing,
            lockout_max_attempts: Self::default_lockout_max_attempts(),
            lockout_minutes: Self::default_lockout_minutes(),
            require_confirmed_email: false,
        }
    }

    /// Returns the account store options described by this configuration.
    pub fn store_options(&self) -> Result<StoreOptions> {
        let max_minutes = LockoutPolicy::MAX_DURATION.as_mins();
        if !(0..=max_minutes).contains(&self.lockout_minutes) {
            return Err(Error::config(format!(
                "lockout duration must be between 0 and {max_minutes} minutes, got {}",
                self.lockout_minutes
            )));
        }

        let lockout = LockoutPolicy {
            max_failed_attempts: self.lockout_max_attempts,
            lockout_duration: SignedDuration::from_mins(self.lockout_minutes),
        };
        lockout.validate()?;

        Ok(StoreOptions {
            lockout,
            password_rules: PasswordRules::default(),
            require_confirmed_email: self.require_confirmed_email,
        })
    }

    fn default_lockout_max_attempts() -> u32 {
        5
    }

    fn default_lockout_minutes() -> i64 {
        5
    }
}
