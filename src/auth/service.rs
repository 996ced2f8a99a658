//! Authentication service
//!
//! Credential verification and the operations backing the authenticated
//! API surface (token issuance, role codes, profile lookup). Collaborators
//! are injected at construction and shared read-only across requests.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::{AuthError, SecretMatcher, UserDirectory, UserRecord};
use crate::metrics;
use crate::token::TokenCodec;

/// Profile projection returned by `/user/info`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub real_name: String,
    pub home_path: String,
    pub roles: Vec<String>,
}

/// Authentication service
pub struct AuthService {
    directory: Arc<dyn UserDirectory>,
    matcher: Arc<dyn SecretMatcher>,
    codec: Arc<TokenCodec>,
}

impl AuthService {
    /// Create a new service with injected collaborators
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        matcher: Arc<dyn SecretMatcher>,
        codec: Arc<TokenCodec>,
    ) -> Self {
        Self {
            directory,
            matcher,
            codec,
        }
    }

    /// Verify a username/password pair against the directory
    ///
    /// "User not found" and "password mismatch" return the identical
    /// `InvalidCredentials` error so failures carry no enumeration signal.
    /// The enabled flag is only consulted after the password matches:
    /// disabled status is not secret, but it is only revealed to a caller
    /// who holds the correct password.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserRecord, AuthError> {
        let user = self
            .directory
            .find_by_username(username)
            .await
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.matcher.matches(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.enabled {
            return Err(AuthError::AccountDisabled);
        }

        Ok(user)
    }

    /// Authenticate and issue a session token
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let user = match self.authenticate(username, password).await {
            Ok(user) => user,
            Err(e) => {
                metrics::record_login_failure(&e);
                return Err(e);
            }
        };

        let token = self.codec.issue(user.id, &user.username, &user.roles)?;
        metrics::record_login_success();
        info!(username = %user.username, "login succeeded");

        Ok(token)
    }

    /// Role codes for an authenticated user
    pub async fn access_codes(&self, user_id: i64) -> Result<Vec<String>, AuthError> {
        let user = self
            .directory
            .find_by_id(user_id)
            .await
            .ok_or(AuthError::UserNotFound)?;

        let mut codes: Vec<String> = user.roles.into_iter().collect();
        codes.sort();
        Ok(codes)
    }

    /// Profile fields for an authenticated user
    pub async fn user_info(&self, user_id: i64) -> Result<UserInfo, AuthError> {
        let user = self
            .directory
            .find_by_id(user_id)
            .await
            .ok_or(AuthError::UserNotFound)?;

        let mut roles: Vec<String> = user.roles.into_iter().collect();
        roles.sort();

        Ok(UserInfo {
            id: user.id,
            username: user.username,
            real_name: user.real_name,
            home_path: user.home_path,
            roles,
        })
    }
}
