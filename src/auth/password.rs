//! Argon2 secret matcher
//!
//! The default `SecretMatcher` implementation. Argon2id with library
//! defaults; verification is constant-time.

use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;
use thiserror::Error;

use super::SecretMatcher;

/// Password hashing errors
#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),
}

/// Hash a plaintext password with a fresh random salt
///
/// Used when loading directory entries from configuration; stored records
/// only ever carry the PHC-format hash string.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Argon2-backed secret matcher
pub struct Argon2Matcher;

impl SecretMatcher for Argon2Matcher {
    fn matches(&self, plaintext: &str, hash: &str) -> bool {
        PasswordHash::new(hash)
            .ok()
            .map(|parsed| {
                Argon2::default()
                    .verify_password(plaintext.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}
