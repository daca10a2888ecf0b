use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rand::{CryptoRng, RngCore};
use uuid::Uuid;

use crate::claims::{IdentityClaims, PayloadClaims};
use crate::config::SigningConfig;
use crate::error::IssueError;

/// Position of a token on its one-way timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// Minted, but the observing clock is still before the issue instant.
    Issued,
    Valid,
    Expired,
}

/// Compact signed token plus the metadata known at issue time.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    token_id: Uuid,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }

    pub fn token_id(&self) -> Uuid {
        self.token_id
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> TokenStatus {
        if now < self.issued_at {
            TokenStatus::Issued
        } else if now < self.expires_at {
            TokenStatus::Valid
        } else {
            TokenStatus::Expired
        }
    }
}

impl AsRef<str> for AccessToken {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"***redacted***")
            .field("token_id", &self.token_id)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Signs identity claims into HS256 compact tokens.
#[derive(Clone)]
pub struct AccessTokenEncoder {
    config: Arc<SigningConfig>,
    key: EncodingKey,
    header: Header,
}

impl AccessTokenEncoder {
    pub fn new(config: Arc<SigningConfig>) -> Self {
        let key = EncodingKey::from_secret(config.secret());
        Self {
            config,
            key,
            header: Header::new(Algorithm::HS256),
        }
    }

    pub fn config(&self) -> &SigningConfig {
        &self.config
    }

    /// Issue a token valid from `now` (truncated to whole seconds) for the configured ttl.
    ///
    /// Every call embeds a fresh token id drawn from `rng`, so identical inputs still
    /// yield distinct tokens.
    pub fn encode<R>(
        &self,
        claims: &IdentityClaims,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<AccessToken, IssueError>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        let issued_at = now.with_nanosecond(0).ok_or(IssueError::InvalidTimestamp)?;
        let expires_at = issued_at
            .checked_add_signed(self.config.ttl())
            .ok_or(IssueError::InvalidTimestamp)?;
        let token_id = new_token_id(rng);

        let payload = PayloadClaims::new(
            claims,
            token_id.to_string(),
            self.config.issuer(),
            self.config.audience(),
            issued_at.timestamp(),
            expires_at.timestamp(),
        );
        let value = encode(&self.header, &payload, &self.key)?;

        Ok(AccessToken {
            value,
            token_id,
            issued_at,
            expires_at,
        })
    }
}

fn new_token_id<R>(rng: &mut R) -> Uuid
where
    R: RngCore + CryptoRng + ?Sized,
{
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn encoder() -> AccessTokenEncoder {
        let config = SigningConfig::new("s3cr3t-key-32-bytes-min", "svc", "api", Duration::minutes(15))
            .expect("config");
        AccessTokenEncoder::new(Arc::new(config))
    }

    fn claims() -> IdentityClaims {
        IdentityClaims::builder("u-1")
            .email("a@b.com")
            .username("alice")
            .role("admin")
            .build()
            .expect("claims")
    }

    #[test]
    fn token_has_three_segments_and_expiry_metadata() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let token = encoder().encode(&claims(), now, &mut rng).expect("encode");

        assert_eq!(token.as_str().split('.').count(), 3);
        assert_eq!(token.issued_at(), now);
        assert_eq!(token.expires_at(), now + Duration::minutes(15));
        assert_eq!(token.token_id().get_version_num(), 4);
    }

    #[test]
    fn issue_time_truncated_to_seconds() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::milliseconds(750);
        let mut rng = StdRng::seed_from_u64(2);
        let token = encoder().encode(&claims(), now, &mut rng).expect("encode");
        assert_eq!(token.issued_at().timestamp_subsec_nanos(), 0);
        assert_eq!(token.issued_at().timestamp(), now.timestamp());
    }

    #[test]
    fn status_follows_timeline() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let token = encoder().encode(&claims(), now, &mut rng).expect("encode");

        assert_eq!(token.status_at(now - Duration::seconds(1)), TokenStatus::Issued);
        assert_eq!(token.status_at(now), TokenStatus::Valid);
        assert_eq!(token.status_at(now + Duration::minutes(15)), TokenStatus::Expired);
    }

    #[test]
    fn debug_hides_token_value() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let token = encoder().encode(&claims(), now, &mut rng).expect("encode");
        assert!(!format!("{token:?}").contains(token.as_str()));
    }
}
