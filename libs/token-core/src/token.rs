use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::{Clock, SystemClock};

/// Signing algorithm for every token issued by this manager.
const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Fixed token lifetime. Not configurable per call; a caller whose token
/// has lapsed must log in again.
const TOKEN_LIFETIME_MINUTES: i64 = 30;

/// Claims carried by an access token.
///
/// The shape is fixed. An open claims mapping exists only inside the JWT
/// serialization boundary; everything past validation works with this
/// struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Always true for tokens issued here.
    pub authorized: bool,
    /// Subject identity.
    pub username: String,
    /// Issued at (Unix seconds).
    pub iat: i64,
    /// Expiry (Unix seconds), `iat` plus the fixed lifetime.
    pub exp: i64,
}

/// Why a presented token was rejected.
///
/// Variants are mutually exclusive and checked in declaration order: a
/// token that is both malformed and expired reports `Malformed`.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token cannot be verified: {0}")]
    Unverifiable(String),
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token has expired")]
    Expired,
    #[error("token claims are invalid")]
    ClaimsInvalid,
    #[error("unable to validate token: {0}")]
    Other(String),
}

/// Issues and validates bearer tokens.
///
/// Holds only immutable state (derived keys, validation rules, clock), so
/// a single instance behind an `Arc` serves arbitrarily many concurrent
/// calls without locking.
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenManager {
    /// Build a manager around the shared secret, using the wall clock.
    ///
    /// An empty secret is a configuration error and is rejected here,
    /// at startup, rather than surfacing per call.
    pub fn new(secret: &str) -> Result<Self> {
        Self::with_clock(secret, Arc::new(SystemClock))
    }

    /// Build a manager with an explicit time source.
    pub fn with_clock(secret: &str, clock: Arc<dyn Clock>) -> Result<Self> {
        if secret.is_empty() {
            bail!("token signing secret must not be empty");
        }

        let mut validation = Validation::new(TOKEN_ALGORITHM);
        // Expiry is checked against the injected clock in validate(), not
        // against the decoder's ambient wall clock.
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            clock,
        })
    }

    /// Issue a signed token for `username`, valid for the fixed lifetime.
    ///
    /// Fails only if the signing step itself fails.
    pub fn issue(&self, username: &str) -> Result<String> {
        let now = self.clock.now();
        let expiry = now + Duration::minutes(TOKEN_LIFETIME_MINUTES);

        let claims = AccessClaims {
            authorized: true,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
        };

        encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| anyhow!("failed to sign access token: {e}"))
    }

    /// Validate a presented token and return its claims.
    ///
    /// Rejects unless all of the following hold: the header names the
    /// expected algorithm, the signature verifies against the shared
    /// secret, the current instant (from the injected clock) is before
    /// `exp`, and the claims deserialize into [`AccessClaims`].
    pub fn validate(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let data = decode::<serde_json::Value>(token, &self.decoding_key, &self.validation)
            .map_err(classify)?;

        // Expiry is checked before claim structure: a live signature with
        // a lapsed exp is Expired, whatever else the claims contain.
        if let Some(exp) = data.claims.get("exp").and_then(serde_json::Value::as_i64) {
            if self.clock.now().timestamp() >= exp {
                return Err(TokenError::Expired);
            }
        }

        serde_json::from_value(data.claims).map_err(|_| TokenError::ClaimsInvalid)
    }
}

/// Map a decode failure onto the rejection taxonomy.
fn classify(err: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::Json(_) => TokenError::Malformed,
        ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidKeyFormat => TokenError::Unverifiable(err.to_string()),
        ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::MissingRequiredClaim(_) => TokenError::ClaimsInvalid,
        _ => TokenError::Other(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    const TEST_SECRET: &str = "test-key";

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn base_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn manager_at(instant: DateTime<Utc>) -> TokenManager {
        TokenManager::with_clock(TEST_SECRET, Arc::new(FixedClock(instant)))
            .expect("manager should build")
    }

    #[test]
    fn empty_secret_is_rejected_at_construction() {
        assert!(TokenManager::new("").is_err());
    }

    #[test]
    fn issued_token_round_trips() {
        let tm = TokenManager::new(TEST_SECRET).expect("manager should build");

        let token = tm.issue("alice").expect("issue should succeed");
        assert_eq!(token.matches('.').count(), 2);

        let claims = tm.validate(&token).expect("fresh token should validate");
        assert!(claims.authorized);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, TOKEN_LIFETIME_MINUTES * 60);
    }

    #[test]
    fn validation_follows_the_injected_clock() {
        let t0 = base_instant();
        let token = manager_at(t0).issue("alice").expect("issue should succeed");

        // One second later: fine.
        assert!(manager_at(t0 + Duration::seconds(1)).validate(&token).is_ok());

        // Thirty-one minutes later: expired, and nothing else.
        let err = manager_at(t0 + Duration::minutes(31))
            .validate(&token)
            .expect_err("lapsed token must fail");
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let t0 = base_instant();
        let token = manager_at(t0).issue("alice").expect("issue should succeed");

        let err = manager_at(t0 + Duration::minutes(TOKEN_LIFETIME_MINUTES))
            .validate(&token)
            .expect_err("token at exactly exp must fail");
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn garbage_is_malformed() {
        let tm = TokenManager::new(TEST_SECRET).expect("manager should build");

        assert!(matches!(tm.validate("aaaaa"), Err(TokenError::Malformed)));
        assert!(matches!(tm.validate("garbage"), Err(TokenError::Malformed)));
    }

    #[test]
    fn foreign_secret_is_signature_invalid_not_malformed() {
        let tm = TokenManager::new(TEST_SECRET).expect("manager should build");
        let other = TokenManager::new("some-other-key").expect("manager should build");

        let token = other.issue("alice").expect("issue should succeed");
        assert!(matches!(
            tm.validate(&token),
            Err(TokenError::SignatureInvalid)
        ));
    }

    #[test]
    fn signature_is_checked_before_expiry() {
        // An expired token signed with the wrong secret reports the
        // signature failure, not the expiry.
        let t0 = base_instant();
        let other = TokenManager::with_clock(
            "some-other-key",
            Arc::new(FixedClock(t0 - Duration::minutes(45))),
        )
        .expect("manager should build");
        let token = other.issue("alice").expect("issue should succeed");

        let tm = manager_at(t0);
        assert!(matches!(
            tm.validate(&token),
            Err(TokenError::SignatureInvalid)
        ));
    }

    #[test]
    fn unexpected_algorithm_is_unverifiable() {
        let claims = AccessClaims {
            authorized: true,
            username: "alice".to_string(),
            iat: base_instant().timestamp(),
            exp: (base_instant() + Duration::minutes(30)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .expect("encode should succeed");

        let tm = manager_at(base_instant());
        assert!(matches!(
            tm.validate(&token),
            Err(TokenError::Unverifiable(_))
        ));
    }

    #[test]
    fn missing_claim_fields_are_claims_invalid() {
        let now = base_instant().timestamp();
        let claims = serde_json::json!({
            "authorized": true,
            "iat": now,
            "exp": now + 600,
        });
        let token = encode(
            &Header::new(TOKEN_ALGORITHM),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .expect("encode should succeed");

        let tm = manager_at(base_instant());
        assert!(matches!(tm.validate(&token), Err(TokenError::ClaimsInvalid)));
    }

    #[test]
    fn non_object_claims_are_claims_invalid() {
        let token = encode(
            &Header::new(TOKEN_ALGORITHM),
            &vec![1, 2, 3],
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .expect("encode should succeed");

        let tm = manager_at(base_instant());
        assert!(matches!(tm.validate(&token), Err(TokenError::ClaimsInvalid)));
    }
}
