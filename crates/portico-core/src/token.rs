//! Signing configuration and HMAC-SHA256 token encoding.
//!
//! A [`TokenEncoder`] turns an ordered [`ClaimSet`] into a compact signed
//! token. Claim types that occur more than once are emitted as a JSON array,
//! integer-valued claims as JSON numbers, and the registered `iss`, `aud`
//! and `exp` claims are always set from the [`SigningConfig`].

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "config")]
use clap::Args;
use jiff::Timestamp;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{Claim, ClaimSet, claim_types};
use crate::{Error, Result};

/// Tracing target for token operations.
const TRACING_TARGET: &str = "portico_core::token";

/// Secrets shorter than this are accepted with a warning.
const RECOMMENDED_SECRET_LEN: usize = 16;

/// Symmetric key and registered claims used to sign tokens.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct SigningConfig {
    /// Shared secret used for HMAC-SHA256 signatures.
    #[cfg_attr(
        feature = "config",
        arg(long = "jwt-secret", env = "JWT_SECRET", hide_env_values = true)
    )]
    #[serde(skip_serializing)]
    pub secret: String,

    /// Value of the `iss` claim.
    #[cfg_attr(
        feature = "config",
        arg(long = "jwt-issuer", env = "JWT_ISSUER", default_value = "portico")
    )]
    #[serde(default = "SigningConfig::default_issuer")]
    pub issuer: String,

    /// Value of the `aud` claim.
    #[cfg_attr(
        feature = "config",
        arg(long = "jwt-audience", env = "JWT_AUDIENCE", default_value = "portico:api")
    )]
    #[serde(default = "SigningConfig::default_audience")]
    pub audience: String,

    /// Token lifetime in hours.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "jwt-expiration-hours",
            env = "JWT_EXPIRATION_HOURS",
            default_value_t = 2
        )
    )]
    #[serde(default = "SigningConfig::default_expiration_hours")]
    pub expiration_hours: i64,
}

impl SigningConfig {
    /// Creates a configuration with the default issuer, audience and lifetime.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: Self::default_issuer(),
            audience: Self::default_audience(),
            expiration_hours: Self::default_expiration_hours(),
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    pub fn with_expiration_hours(mut self, hours: i64) -> Self {
        self.expiration_hours = hours;
        self
    }

    /// Longest accepted token lifetime.
    pub const MAX_EXPIRATION_HOURS: i64 = 24 * 365;

    /// Checks that the secret is present and the lifetime is within
    /// `1..=MAX_EXPIRATION_HOURS`.
    pub fn validate(&self) -> Result<()> {
        if self.secret.is_empty() {
            return Err(Error::config("signing secret must not be empty"));
        }

        if self.expiration_hours <= 0 {
            return Err(Error::config(format!(
                "token lifetime must be positive, got {} hours",
                self.expiration_hours
            )));
        }

        if self.expiration_hours > Self::MAX_EXPIRATION_HOURS {
            return Err(Error::config(format!(
                "token lifetime must be at most {} hours, got {}",
                Self::MAX_EXPIRATION_HOURS,
                self.expiration_hours
            )));
        }

        Ok(())
    }

    /// Returns the token lifetime in seconds.
    #[inline]
    pub fn expires_in_secs(&self) -> u64 {
        self.expiration_hours
            .max(0)
            .unsigned_abs()
            .saturating_mul(3600)
    }

    fn default_issuer() -> String {
        "portico".to_owned()
    }

    fn default_audience() -> String {
        "portico:api".to_owned()
    }

    fn default_expiration_hours() -> i64 {
        2
    }
}

impl fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningConfig")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiration_hours", &self.expiration_hours)
            .finish()
    }
}

/// Signs claim sets into compact tokens and verifies them back.
#[derive(Clone)]
pub struct TokenEncoder {
    inner: Arc<TokenEncoderInner>,
}

struct TokenEncoderInner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: SigningConfig,
}

impl TokenEncoder {
    /// Creates an encoder, rejecting an unusable configuration.
    pub fn new(config: SigningConfig) -> Result<Self> {
        config.validate()?;

        if config.secret.len() < RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                target: TRACING_TARGET,
                secret_len = config.secret.len(),
                recommended = RECOMMENDED_SECRET_LEN,
                "Signing secret is shorter than recommended",
            );
        }

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        tracing::info!(
            target: TRACING_TARGET,
            issuer = %config.issuer,
            audience = %config.audience,
            expiration_hours = config.expiration_hours,
            "Token encoder initialized",
        );

        let inner = Arc::new(TokenEncoderInner {
            encoding_key,
            decoding_key,
            config,
        });

        Ok(Self { inner })
    }

    /// Returns the configuration this encoder was built from.
    #[inline]
    pub fn config(&self) -> &SigningConfig {
        &self.inner.config
    }

    /// Returns the token lifetime in seconds.
    #[inline]
    pub fn expires_in(&self) -> u64 {
        self.inner.config.expires_in_secs()
    }

    /// Signs `claims`, expiring `expiration_hours` after `now`.
    pub fn encode(&self, claims: &ClaimSet, now: Timestamp) -> Result<String> {
        let payload = self.payload(claims, now);
        let header = Header::new(Algorithm::HS256);

        encode(&header, &payload, &self.inner.encoding_key).map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET,
                error = %e,
                claim_count = claims.len(),
                "Failed to encode token",
            );

            Error::token("token signing failed").with_source(e)
        })
    }

    /// Verifies signature, issuer, audience and validity window of `token`.
    pub fn decode(&self, token: &str) -> Result<DecodedToken> {
        let config = &self.inner.config;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = true;
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["iss", "aud", "sub", "exp"]);

        let token_data = decode::<Map<String, Value>>(token, &self.inner.decoding_key, &validation)
            .map_err(|e| {
                let message = match e.kind() {
                    JwtErrorKind::ExpiredSignature => "token has expired",
                    JwtErrorKind::ImmatureSignature => "token is not yet valid",
                    JwtErrorKind::InvalidSignature => "token signature is invalid",
                    JwtErrorKind::InvalidIssuer => "token issuer is not accepted",
                    JwtErrorKind::InvalidAudience => "token audience is not accepted",
                    JwtErrorKind::MissingRequiredClaim(_) => "token is missing a required claim",
                    _ => "token is malformed",
                };

                tracing::debug!(
                    target: TRACING_TARGET,
                    error = %e,
                    "Token verification failed",
                );

                Error::token(message).with_source(e)
            })?;

        Ok(DecodedToken {
            claims: token_data.claims,
        })
    }

    fn payload(&self, claims: &ClaimSet, now: Timestamp) -> Map<String, Value> {
        let config = &self.inner.config;
        let mut payload = Map::new();

        for claim in claims {
            append_claim(&mut payload, claim);
        }

        // Registered claims from the configuration win over same-named entries.
        payload.insert(
            claim_types::ISSUER.to_owned(),
            Value::String(config.issuer.clone()),
        );
        payload.insert(
            claim_types::AUDIENCE.to_owned(),
            Value::String(config.audience.clone()),
        );
        payload.insert(
            claim_types::EXPIRATION.to_owned(),
            Value::from(
                now.as_second()
                    .saturating_add(config.expiration_hours.saturating_mul(3600)),
            ),
        );

        payload
    }
}

impl fmt::Debug for TokenEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenEncoder")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

fn append_claim(payload: &mut Map<String, Value>, claim: &Claim) {
    let value = claim.to_json_value();
    match payload.get_mut(claim.claim_type()) {
        None => {
            payload.insert(claim.claim_type().to_owned(), value);
        }
        Some(Value::Array(values)) => values.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}

/// The verified payload of a token.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedToken {
    claims: Map<String, Value>,
}

impl DecodedToken {
    /// Returns the raw payload.
    #[inline]
    pub fn payload(&self) -> &Map<String, Value> {
        &self.claims
    }

    pub fn subject(&self) -> Option<&str> {
        self.claims.get(claim_types::SUBJECT)?.as_str()
    }

    pub fn email(&self) -> Option<&str> {
        self.claims.get(claim_types::EMAIL)?.as_str()
    }

    pub fn token_id(&self) -> Option<&str> {
        self.claims.get(claim_types::TOKEN_ID)?.as_str()
    }

    pub fn issued_at(&self) -> Option<i64> {
        self.claims.get(claim_types::ISSUED_AT)?.as_i64()
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.claims.get(claim_types::EXPIRATION)?.as_i64()
    }

    /// Returns every string value of `claim_type`, whether stored as a
    /// single value or an array.
    pub fn values_of(&self, claim_type: &str) -> Vec<&str> {
        match self.claims.get(claim_type) {
            Some(Value::Array(values)) => values.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(value)) => vec![value.as_str()],
            _ => Vec::new(),
        }
    }

    /// Returns the role claims.
    pub fn roles(&self) -> Vec<&str> {
        self.values_of(claim_types::ROLE)
    }

    /// Flattens the payload back into a claim set, expanding arrays.
    pub fn to_claim_set(&self) -> ClaimSet {
        let mut claims = ClaimSet::new();
        for (claim_type, value) in &self.claims {
            match value {
                Value::Array(values) => claims.extend(
                    values
                        .iter()
                        .filter_map(|value| Claim::from_json_value(claim_type, value)),
                ),
                value => claims.extend(Claim::from_json_value(claim_type, value)),
            }
        }
        claims
    }
}
