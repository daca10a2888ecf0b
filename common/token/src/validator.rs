use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;
use tracing::debug;

use crate::claims::{IdentityClaims, PayloadRepr, CLAIM_EMAIL, CLAIM_EXPIRY, CLAIM_SUBJECT, CLAIM_USERNAME};
use crate::config::SigningConfig;
use crate::error::{AuthResult, TokenError};

const TOKEN_SEGMENTS: usize = 3;

/// Verifies compact tokens against one [`SigningConfig`].
///
/// Checks run in a fixed order (structure, signature, issuer, audience, expiry,
/// required claims) and the first failure is returned.
#[derive(Clone)]
pub struct TokenValidator {
    config: Arc<SigningConfig>,
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(config: Arc<SigningConfig>) -> Self {
        let key = DecodingKey::from_secret(config.secret());

        // Only the signature is delegated; registered claims are checked below
        // against the caller's clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        validation.leeway = 0;

        Self {
            config,
            key,
            validation,
        }
    }

    pub fn config(&self) -> &SigningConfig {
        &self.config
    }

    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> AuthResult<IdentityClaims> {
        match self.check(token, now) {
            Ok((claims, token_id)) => {
                debug!(subject = claims.subject(), jti = token_id.as_deref(), "validated access token");
                Ok(claims)
            }
            Err(err) => {
                debug!(reason = err.reason(), "rejected access token");
                Err(err)
            }
        }
    }

    fn check(&self, token: &str, now: DateTime<Utc>) -> AuthResult<(IdentityClaims, Option<String>)> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != TOKEN_SEGMENTS || segments.iter().any(|segment| segment.is_empty()) {
            return Err(TokenError::Malformed);
        }

        let token_data = decode::<Value>(token, &self.key, &self.validation)?;
        let payload: PayloadRepr =
            serde_json::from_value(token_data.claims).map_err(|_| TokenError::Malformed)?;

        if payload.iss.as_deref() != Some(self.config.issuer()) {
            return Err(TokenError::IssuerMismatch);
        }

        let audience_matches = payload
            .aud
            .as_ref()
            .is_some_and(|aud| aud.contains(self.config.audience()));
        if !audience_matches {
            return Err(TokenError::AudienceMismatch);
        }

        let exp = payload.exp.ok_or(TokenError::MissingClaim(CLAIM_EXPIRY))?;
        let expires_at = Utc
            .timestamp_opt(exp, 0)
            .single()
            .ok_or(TokenError::Malformed)?;
        if now >= expires_at {
            return Err(TokenError::Expired);
        }

        let subject = payload
            .sub
            .filter(|sub| !sub.trim().is_empty())
            .ok_or(TokenError::MissingClaim(CLAIM_SUBJECT))?;
        let email = payload.email.ok_or(TokenError::MissingClaim(CLAIM_EMAIL))?;
        let username = payload
            .unique_name
            .ok_or(TokenError::MissingClaim(CLAIM_USERNAME))?;
        let roles = payload.role.map(|role| role.into_vec()).unwrap_or_default();

        let claims = IdentityClaims::from_verified(subject, email, username, roles);
        Ok((claims, payload.jti))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "s3cr3t-key-32-bytes-min";

    fn validator() -> TokenValidator {
        let config = SigningConfig::new(SECRET, "svc", "api", Duration::minutes(15)).expect("config");
        TokenValidator::new(Arc::new(config))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn sign(payload: &Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            payload,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("sign token")
    }

    fn full_payload() -> Value {
        json!({
            "sub": "u-1",
            "email": "a@b.com",
            "unique_name": "alice",
            "jti": "4f0c2a4e-7a2b-4d8e-9a57-0a1b2c3d4e5f",
            "role": ["admin", "ops", "admin"],
            "iss": "svc",
            "aud": "api",
            "iat": now().timestamp(),
            "exp": (now() + Duration::minutes(15)).timestamp(),
        })
    }

    #[test]
    fn structural_failures_are_malformed() {
        let validator = validator();
        for token in ["", "abc", "a.b", "a.b.c.d", "..", "a..c", "not a token"] {
            assert_eq!(validator.validate(token, now()), Err(TokenError::Malformed), "{token}");
        }
    }

    #[test]
    fn garbage_header_is_malformed() {
        let token = sign(&full_payload());
        let mut segments: Vec<&str> = token.split('.').collect();
        segments[0] = "!!!";
        let tampered = segments.join(".");
        assert_eq!(validator().validate(&tampered, now()), Err(TokenError::Malformed));
    }

    #[test]
    fn other_algorithm_is_rejected_as_signature_failure() {
        let token = encode(
            &Header::new(Algorithm::HS512),
            &full_payload(),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("sign token");
        assert_eq!(validator().validate(&token, now()), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn roles_deduplicated_in_order() {
        let claims = validator().validate(&sign(&full_payload()), now()).expect("valid");
        assert_eq!(claims.roles(), ["admin", "ops"]);
    }

    #[test]
    fn single_role_string_is_accepted() {
        let mut payload = full_payload();
        payload["role"] = json!("admin");
        let claims = validator().validate(&sign(&payload), now()).expect("valid");
        assert_eq!(claims.roles(), ["admin"]);
    }

    #[test]
    fn audience_list_containing_expected_is_accepted() {
        let mut payload = full_payload();
        payload["aud"] = json!(["web", "api"]);
        assert!(validator().validate(&sign(&payload), now()).is_ok());
    }

    #[test]
    fn missing_issuer_is_mismatch() {
        let mut payload = full_payload();
        payload.as_object_mut().unwrap().remove("iss");
        assert_eq!(validator().validate(&sign(&payload), now()), Err(TokenError::IssuerMismatch));
    }

    #[test]
    fn missing_expiry_reported() {
        let mut payload = full_payload();
        payload.as_object_mut().unwrap().remove("exp");
        assert_eq!(
            validator().validate(&sign(&payload), now()),
            Err(TokenError::MissingClaim("exp"))
        );
    }

    #[test]
    fn each_required_claim_reported_by_name() {
        for name in ["sub", "email", "unique_name"] {
            let mut payload = full_payload();
            payload.as_object_mut().unwrap().remove(name);
            assert_eq!(
                validator().validate(&sign(&payload), now()),
                Err(TokenError::MissingClaim(name)),
                "{name}"
            );
        }
    }

    #[test]
    fn blank_subject_counts_as_missing() {
        let mut payload = full_payload();
        payload["sub"] = json!("");
        assert_eq!(
            validator().validate(&sign(&payload), now()),
            Err(TokenError::MissingClaim("sub"))
        );
    }

    #[test]
    fn issuer_checked_before_expiry() {
        let mut payload = full_payload();
        payload["iss"] = json!("other");
        let later = now() + Duration::hours(2);
        assert_eq!(validator().validate(&sign(&payload), later), Err(TokenError::IssuerMismatch));
    }

    #[test]
    fn expiry_checked_before_required_claims() {
        let mut payload = full_payload();
        payload.as_object_mut().unwrap().remove("email");
        let later = now() + Duration::hours(2);
        assert_eq!(validator().validate(&sign(&payload), later), Err(TokenError::Expired));
    }

    #[test]
    fn wrongly_typed_claim_is_malformed() {
        let mut payload = full_payload();
        payload["exp"] = json!("tomorrow");
        assert_eq!(validator().validate(&sign(&payload), now()), Err(TokenError::Malformed));
    }
}
