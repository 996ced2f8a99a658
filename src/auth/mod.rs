//! Authentication module
//!
//! Credential verification, the per-request authentication gate, and the
//! trait seams for the injected collaborators (user directory, secret
//! matcher).

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

use crate::token::TokenError;

pub mod gate;
pub mod password;
pub mod service;

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown username or wrong password. Deliberately a single variant:
    /// callers must not be able to tell which one occurred.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Account disabled")]
    AccountDisabled,

    #[error("User not found")]
    UserNotFound,

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// A user record as stored in the directory
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub real_name: String,
    pub home_path: String,
    pub roles: HashSet<String>,
    pub enabled: bool,
}

/// User directory trait
///
/// The external store of user records, consulted by username at login and
/// by id for profile lookups.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Option<UserRecord>;

    async fn find_by_id(&self, id: i64) -> Option<UserRecord>;
}

/// Secret matcher trait
///
/// Verifies a plaintext secret against a stored hash. Implementations must
/// compare in constant time.
pub trait SecretMatcher: Send + Sync {
    fn matches(&self, plaintext: &str, hash: &str) -> bool;
}
