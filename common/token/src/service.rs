use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use tracing::info;

use crate::claims::IdentityClaims;
use crate::clock::{Clock, SystemClock};
use crate::config::SigningConfig;
use crate::encoder::{AccessToken, AccessTokenEncoder};
use crate::error::{AuthResult, IssueError};
use crate::metrics::{TokenMetrics, KIND_ACCESS, KIND_REFRESH, OUTCOME_VALID};
use crate::refresh::{RefreshToken, RefreshTokenGenerator};
use crate::validator::TokenValidator;

pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Issuance and validation seam consumed by request-handling layers.
pub trait TokenProvider: Send + Sync {
    fn generate_access_token(&self, claims: &IdentityClaims) -> Result<AccessToken, IssueError>;
    fn generate_refresh_token(&self) -> RefreshToken;
    fn validate_token(&self, token: &str) -> AuthResult<IdentityClaims>;
}

/// Access/refresh pair returned by [`TokenService::issue_tokens`].
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_expires_at: DateTime<Utc>,
    pub access_expires_in: i64,
    pub token_type: &'static str,
}

/// Ties encoder, validator and refresh generator to one config, a clock and the OS RNG.
#[derive(Clone)]
pub struct TokenService {
    encoder: AccessTokenEncoder,
    validator: TokenValidator,
    refresh: RefreshTokenGenerator,
    clock: Arc<dyn Clock>,
    metrics: Option<TokenMetrics>,
}

impl TokenService {
    pub fn new(config: SigningConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: SigningConfig, clock: Arc<dyn Clock>) -> Self {
        let config = Arc::new(config);
        Self {
            encoder: AccessTokenEncoder::new(config.clone()),
            validator: TokenValidator::new(config),
            refresh: RefreshTokenGenerator::new(),
            clock,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: TokenMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &SigningConfig {
        self.encoder.config()
    }

    pub fn encoder(&self) -> &AccessTokenEncoder {
        &self.encoder
    }

    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    pub fn metrics(&self) -> Option<&TokenMetrics> {
        self.metrics.as_ref()
    }

    /// Mint an access token and an unrelated refresh token in one call.
    pub fn issue_tokens(&self, claims: &IdentityClaims) -> Result<IssuedTokens, IssueError> {
        let access_token = self.generate_access_token(claims)?;
        let refresh_token = self.generate_refresh_token();
        let access_expires_at = access_token.expires_at();
        let access_expires_in = self.config().ttl().num_seconds();

        info!(
            subject = claims.subject(),
            jti = %access_token.token_id(),
            expires_in = access_expires_in,
            "issued token pair"
        );

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            access_expires_at,
            access_expires_in,
            token_type: TOKEN_TYPE_BEARER,
        })
    }

    fn record(&self, f: impl FnOnce(&TokenMetrics)) {
        if let Some(metrics) = &self.metrics {
            f(metrics);
        }
    }
}

impl TokenProvider for TokenService {
    fn generate_access_token(&self, claims: &IdentityClaims) -> Result<AccessToken, IssueError> {
        let token = self.encoder.encode(claims, self.clock.now(), &mut OsRng)?;
        self.record(|metrics| metrics.token_issued(KIND_ACCESS));
        Ok(token)
    }

    fn generate_refresh_token(&self) -> RefreshToken {
        let token = self.refresh.generate_default();
        self.record(|metrics| metrics.token_issued(KIND_REFRESH));
        token
    }

    fn validate_token(&self, token: &str) -> AuthResult<IdentityClaims> {
        let result = self.validator.validate(token, self.clock.now());
        let outcome = match &result {
            Ok(_) => OUTCOME_VALID,
            Err(err) => err.reason(),
        };
        self.record(|metrics| metrics.validation(outcome));
        result
    }
}
