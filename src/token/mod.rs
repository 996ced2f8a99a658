//! Token codec
//!
//! Issues and verifies HS256-signed session tokens. A token embeds the
//! caller's identity claims; the signature covers the entire payload, so
//! tampering with any claim (including `exp`) invalidates it.

use std::collections::HashSet;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TokenConfig;

/// Token errors
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Bad signature")]
    BadSignature,

    #[error("Token expired")]
    Expired,
}

/// Identity claims embedded in a token
///
/// `roles` is a set: encoding order is arbitrary and equality is
/// order-independent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// User id
    pub uid: i64,
    /// Role codes
    pub roles: HashSet<String>,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expires at (Unix seconds)
    pub exp: i64,
}

/// Token codec
///
/// Holds the process-wide signing secret and token lifetime. Constructed
/// once at startup and shared read-only across requests; the secret is
/// never rotated at runtime (rotation would need a key id in the token
/// header, which this codec does not emit).
///
/// # Example
///
/// ```
/// use kitsune_authr::token::TokenCodec;
/// use std::collections::HashSet;
///
/// let codec = TokenCodec::new("my-signing-secret", 3600);
/// let roles: HashSet<String> = ["admin".to_string()].into();
/// let token = codec.issue(1, "alice", &roles).unwrap();
/// let claims = codec.verify(&token).unwrap();
/// assert_eq!(claims.sub, "alice");
/// ```
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl TokenCodec {
    /// Create a codec with a shared secret (HS256) and token lifetime in seconds
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0; // exact expiry, no grace window

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        }
    }

    /// Create a codec from configuration
    pub fn from_config(config: &TokenConfig) -> Self {
        Self::new(&config.secret, config.expiration_secs)
    }

    /// Issue a token for the given identity, valid from now for the
    /// configured lifetime
    pub fn issue(
        &self,
        user_id: i64,
        username: &str,
        roles: &HashSet<String>,
    ) -> Result<String, TokenError> {
        self.issue_at(user_id, username, roles, chrono::Utc::now().timestamp())
    }

    /// Issue a token with a pinned issue time
    ///
    /// `exp` is always `issued_at + ttl`. Deterministic given identical
    /// inputs; exists so tests can mint tokens at arbitrary points in time.
    pub fn issue_at(
        &self,
        user_id: i64,
        username: &str,
        roles: &HashSet<String>,
        issued_at: i64,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: username.to_string(),
            uid: user_id,
            roles: roles.clone(),
            iat: issued_at,
            exp: issued_at + self.ttl_secs,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Malformed(e.to_string()))
    }

    /// Verify a token and return the embedded claims
    ///
    /// Fails with `Malformed` if the token does not parse into
    /// payload + signature, `BadSignature` if the signature does not match,
    /// and `Expired` once `exp` has elapsed. Claims are extracted in the
    /// same pass that checks the signature.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed(e.to_string()),
            })
    }
}
