//! JWT token handling for account sessions
//!
//! Tokens are HS256-signed and carry the account id and handle. A configured
//! lifetime of zero issues tokens without an `exp` claim.

use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::{AuthError, KicklistError};

/// Minimum accepted length for a production signing secret
pub const MIN_SECRET_LEN: usize = 32;

/// Payload stored in a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Account id as 24-char hex
    pub account_id: String,
    /// Handle at the time of issue
    pub handle: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp), absent for non-expiring tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

/// JWT issuer and verifier
#[derive(Clone)]
pub struct JwtValidator {
    secret: String,
    expiry_seconds: u64,
}

impl std::fmt::Debug for JwtValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtValidator")
            .field("expiry_seconds", &self.expiry_seconds)
            .finish_non_exhaustive()
    }
}

impl JwtValidator {
    /// Create a new validator
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self, KicklistError> {
        if secret.is_empty() {
            return Err(KicklistError::Config(
                "JWT_SECRET is required outside dev mode".into(),
            ));
        }

        if secret.len() < MIN_SECRET_LEN {
            return Err(KicklistError::Config(format!(
                "JWT_SECRET must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }

        Ok(Self {
            secret,
            expiry_seconds,
        })
    }

    /// Validator for dev mode with a fixed, publicly known secret
    pub fn new_dev(expiry_seconds: u64) -> Self {
        Self {
            secret: "kicklist-dev-secret-not-for-production-use".into(),
            expiry_seconds,
        }
    }

    /// Issue a token for an authenticated account
    pub fn issue(&self, account_id: &str, handle: &str) -> Result<String, KicklistError> {
        let now = unix_now()?;

        let claims = Claims {
            account_id: account_id.to_string(),
            handle: handle.to_string(),
            iat: now,
            exp: (self.expiry_seconds > 0).then(|| now + self.expiry_seconds),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| KicklistError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        if self.expiry_seconds == 0 {
            validation.required_spec_claims = HashSet::new();
        }

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|err| match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::Malformed,
        })
    }
}

fn unix_now() -> Result<u64, KicklistError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| KicklistError::Internal(format!("System time error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "a-test-secret-that-is-long-enough-for-hs256";

    #[test]
    fn test_short_secret_rejected() {
        assert!(JwtValidator::new("short".into(), 3600).is_err());
        assert!(JwtValidator::new(String::new(), 3600).is_err());
        assert!(JwtValidator::new(SECRET.into(), 3600).is_ok());
    }

    #[test]
    fn test_issue_and_verify() {
        let jwt = JwtValidator::new(SECRET.into(), 3600).unwrap();
        let token = jwt.issue("65a1f0c2e4b0a1b2c3d4e5f6", "ada").unwrap();

        let claims = jwt.verify(&token).unwrap();
        assert_eq!(claims.account_id, "65a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(claims.handle, "ada");
        assert_eq!(claims.exp, Some(claims.iat + 3600));
    }

    #[test]
    fn test_zero_expiry_issues_non_expiring_token() {
        let jwt = JwtValidator::new(SECRET.into(), 0).unwrap();
        let token = jwt.issue("65a1f0c2e4b0a1b2c3d4e5f6", "ada").unwrap();

        let claims = jwt.verify(&token).unwrap();
        assert_eq!(claims.exp, None);
    }

    #[test]
    fn test_expired_token_reported_as_expired() {
        let jwt = JwtValidator::new(SECRET.into(), 3600).unwrap();
        let now = unix_now().unwrap();
        let claims = Claims {
            account_id: "65a1f0c2e4b0a1b2c3d4e5f6".into(),
            handle: "ada".into(),
            iat: now - 7200,
            exp: Some(now - 3600),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(jwt.verify(&token), Err(AuthError::Expired));
    }

    #[test]
    fn test_foreign_signature_is_malformed() {
        let jwt = JwtValidator::new(SECRET.into(), 3600).unwrap();
        let other = JwtValidator::new("another-secret-that-is-also-long-enough".into(), 3600).unwrap();
        let token = other.issue("65a1f0c2e4b0a1b2c3d4e5f6", "ada").unwrap();

        assert_eq!(jwt.verify(&token), Err(AuthError::Malformed));
        assert_eq!(jwt.verify("not.a.jwt"), Err(AuthError::Malformed));
    }
}
