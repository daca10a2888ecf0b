use std::env;

use chrono::Duration;
use common_crypto::SigningSecret;
use serde::Deserialize;

use crate::error::ConfigError;

pub const ENV_SECRET: &str = "JWT_SECRET";
pub const ENV_ISSUER: &str = "JWT_ISSUER";
pub const ENV_AUDIENCE: &str = "JWT_AUDIENCE";
pub const ENV_EXPIRATION_MINUTES: &str = "JWT_EXPIRATION_MINUTES";

const DEFAULT_EXPIRATION_MINUTES: i64 = 60;

/// Immutable signing and validation settings shared by every encode/validate call.
#[derive(Debug, Clone)]
pub struct SigningConfig {
    secret: SigningSecret,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl SigningConfig {
    /// Validate and freeze the settings. Fails on an undersized secret, blank
    /// issuer/audience, or a lifetime that is not a positive whole number of seconds.
    pub fn new(
        secret: impl AsRef<[u8]>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        ttl: Duration,
    ) -> Result<Self, ConfigError> {
        let secret = SigningSecret::from_bytes(secret)?;

        let issuer = issuer.into();
        if issuer.trim().is_empty() {
            return Err(ConfigError::EmptyIssuer);
        }
        let audience = audience.into();
        if audience.trim().is_empty() {
            return Err(ConfigError::EmptyAudience);
        }
        if ttl <= Duration::zero() || ttl.subsec_nanos() != 0 {
            return Err(ConfigError::InvalidTtl);
        }

        Ok(Self {
            secret,
            issuer,
            audience,
            ttl,
        })
    }

    /// Load from `JWT_SECRET`, `JWT_ISSUER`, `JWT_AUDIENCE` and the optional
    /// `JWT_EXPIRATION_MINUTES` (defaults to 60).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup(ENV_SECRET)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingVar(ENV_SECRET))?;
        let issuer = lookup(ENV_ISSUER)
            .and_then(|value| normalize_optional(&value))
            .ok_or(ConfigError::MissingVar(ENV_ISSUER))?;
        let audience = lookup(ENV_AUDIENCE)
            .and_then(|value| normalize_optional(&value))
            .ok_or(ConfigError::MissingVar(ENV_AUDIENCE))?;
        let minutes = match lookup(ENV_EXPIRATION_MINUTES).and_then(|value| normalize_optional(&value)) {
            Some(raw) => raw.parse::<i64>().map_err(|_| ConfigError::InvalidVar {
                key: ENV_EXPIRATION_MINUTES,
                value: raw.clone(),
            })?,
            None => DEFAULT_EXPIRATION_MINUTES,
        };

        Self::new(secret.as_bytes(), issuer, audience, ttl_from_minutes(minutes)?)
    }

    pub(crate) fn secret(&self) -> &[u8] {
        self.secret.expose()
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Serde-bindable form of the settings, e.g. a `jwt` section of a config file.
#[derive(Clone, Deserialize)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    #[serde(default = "default_expiration_minutes")]
    pub expiration_in_minutes: i64,
}

impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"***redacted***")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiration_in_minutes", &self.expiration_in_minutes)
            .finish()
    }
}

impl TryFrom<JwtSettings> for SigningConfig {
    type Error = ConfigError;

    fn try_from(value: JwtSettings) -> Result<Self, Self::Error> {
        let ttl = ttl_from_minutes(value.expiration_in_minutes)?;
        SigningConfig::new(value.secret.as_bytes(), value.issuer, value.audience, ttl)
    }
}

fn default_expiration_minutes() -> i64 {
    DEFAULT_EXPIRATION_MINUTES
}

fn ttl_from_minutes(minutes: i64) -> Result<Duration, ConfigError> {
    Duration::try_minutes(minutes).ok_or(ConfigError::InvalidTtl)
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
