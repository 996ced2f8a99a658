//! In-memory user directory
//!
//! The injected `UserDirectory` implementation. Records are built from the
//! `users:` section of the configuration at startup; plaintext passwords
//! from the config are hashed on load and never retained.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::auth::password::{hash_password, PasswordError};
use crate::auth::{UserDirectory, UserRecord};
use crate::config::UserEntry;

/// Directory construction errors
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Duplicate username: {0}")]
    DuplicateUser(String),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// In-memory user directory
pub struct MemoryDirectory {
    by_id: HashMap<i64, UserRecord>,
    id_by_name: HashMap<String, i64>,
}

impl MemoryDirectory {
    /// Build a directory from configured users
    ///
    /// Ids are assigned sequentially in configuration order, starting at 1.
    pub fn from_config(users: &[UserEntry]) -> Result<Self, DirectoryError> {
        let mut records = Vec::with_capacity(users.len());

        for (index, entry) in users.iter().enumerate() {
            records.push(UserRecord {
                id: index as i64 + 1,
                username: entry.username.clone(),
                password_hash: hash_password(&entry.password)?,
                real_name: entry.real_name.clone(),
                home_path: entry.home_path.clone(),
                roles: entry.roles.clone(),
                enabled: entry.enabled,
            });
        }

        let directory = Self::try_from_records(records)?;
        info!(count = directory.by_id.len(), "user directory loaded");
        Ok(directory)
    }

    /// Build a directory from prepared records (hashes already computed)
    ///
    /// Panics on duplicate usernames; use `from_config` for untrusted
    /// input.
    pub fn from_records(records: Vec<UserRecord>) -> Self {
        Self::try_from_records(records).expect("duplicate username in records")
    }

    fn try_from_records(records: Vec<UserRecord>) -> Result<Self, DirectoryError> {
        let mut by_id = HashMap::with_capacity(records.len());
        let mut id_by_name = HashMap::with_capacity(records.len());

        for record in records {
            if id_by_name
                .insert(record.username.clone(), record.id)
                .is_some()
            {
                return Err(DirectoryError::DuplicateUser(record.username));
            }
            by_id.insert(record.id, record);
        }

        Ok(Self { by_id, id_by_name })
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn find_by_username(&self, username: &str) -> Option<UserRecord> {
        self.id_by_name
            .get(username)
            .and_then(|id| self.by_id.get(id))
            .cloned()
    }

    async fn find_by_id(&self, id: i64) -> Option<UserRecord> {
        self.by_id.get(&id).cloned()
    }
}
