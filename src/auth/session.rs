//! Session token issuance and verification.
//!
//! On successful login the service mints a signed, time-limited bearer
//! token (HS256 JWT) whose subject is the account id. The same issuer
//! verifies tokens presented on authenticated routes.

use crate::error::{LockgateError, Result};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (account id)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Expiration time (unix timestamp)
    pub exp: u64,
    /// Issued at (unix timestamp)
    pub iat: u64,
    /// JWT ID (unique identifier)
    pub jti: String,
}

/// Issues and verifies session tokens.
#[derive(Clone)]
pub struct SessionTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl: Duration,
}

impl SessionTokenIssuer {
    /// Create an issuer with an HS256 secret, issuer name, and fixed TTL.
    pub fn new(secret: &[u8], issuer: impl Into<String>, ttl: Duration) -> Self {
        let issuer = issuer.into();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_issuer(&[issuer.clone()]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer,
            ttl,
        }
    }

    /// Issue a signed session token for an account.
    pub fn issue(&self, account_id: Uuid) -> Result<String> {
        let now = current_timestamp();
        let claims = SessionClaims {
            sub: account_id.to_string(),
            iss: self.issuer.clone(),
            exp: now + self.ttl.as_secs(),
            iat: now,
            jti: generate_jti(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| LockgateError::internal(format!("Failed to encode session token: {}", e)))
    }

    /// Verify a bearer token, returning its claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| LockgateError::unauthorized(format!("Invalid token: {}", e)))
    }

    /// Token lifetime in seconds.
    pub fn expires_in(&self) -> u64 {
        self.ttl.as_secs()
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn generate_jti() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key-32-bytes-long!!!";

    fn test_issuer() -> SessionTokenIssuer {
        SessionTokenIssuer::new(SECRET, "test-app", Duration::from_secs(3600))
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let issuer = test_issuer();
        let account_id = Uuid::new_v4();

        let token = issuer.issue(account_id).unwrap();
        let claims = issuer.verify(&token).unwrap();

        assert_eq!(claims.sub, account_id.to_string());
        assert_eq!(claims.iss, "test-app");
        assert!(claims.exp > claims.iat);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let issuer = test_issuer();
        let token = issuer.issue(Uuid::new_v4()).unwrap();

        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });

        assert!(issuer.verify(&tampered).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = test_issuer();
        let other = SessionTokenIssuer::new(b"another-secret", "test-app", Duration::from_secs(3600));

        let token = other.issue(Uuid::new_v4()).unwrap();
        assert!(issuer.verify(&token).is_err());
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let issuer = test_issuer();
        let other = SessionTokenIssuer::new(SECRET, "other-app", Duration::from_secs(3600));

        let token = other.issue(Uuid::new_v4()).unwrap();
        assert!(issuer.verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = test_issuer();
        let now = current_timestamp();

        // Hand-craft claims already expired beyond the default leeway
        let claims = SessionClaims {
            sub: Uuid::new_v4().to_string(),
            iss: "test-app".to_string(),
            exp: now - 3600,
            iat: now - 7200,
            jti: generate_jti(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(issuer.verify(&token).is_err());
    }

    #[test]
    fn test_algorithm_confusion_rejected() {
        let issuer = test_issuer();
        let now = current_timestamp();

        let claims = SessionClaims {
            sub: "subject".to_string(),
            iss: "test-app".to_string(),
            exp: now + 3600,
            iat: now,
            jti: generate_jti(),
        };
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(issuer.verify(&token).is_err());
    }

    #[test]
    fn test_none_algorithm_rejected() {
        let issuer = test_issuer();

        // Header: {"alg":"none","typ":"JWT"} followed by an unsigned payload
        let none_header = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0";
        let payload = "eyJzdWIiOiJ1c2VyMTIzIiwiZXhwIjo5OTk5OTk5OTk5fQ";
        let none_token = format!("{}.{}.", none_header, payload);

        assert!(issuer.verify(&none_token).is_err());
    }
}
