//! Credential storage and management
//!
//! Username → password map persisted as a JSON document next to the metadata
//! sidecar.

use log::{error, info};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AuthError;
use crate::storage::filesystem::{create_directory, replace_atomically};

/// Accounts seeded when no credential document exists yet
pub const DEFAULT_CREDENTIALS: [(&str, &str); 3] =
    [("user1", "1234"), ("user2", "5678"), ("admin", "admin")];

/// Credential store backed by a JSON document
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
    users: BTreeMap<String, String>,
}

impl CredentialStore {
    /// Load the credential document at `path`, seeding the default accounts
    /// when it does not exist. A malformed document is an error.
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        let users: BTreeMap<String, String> = match fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data).map_err(|e| {
                error!("Failed to parse credentials {}: {}", path.display(), e);
                AuthError::from(e)
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "No credentials at {}, seeding default accounts",
                    path.display()
                );
                DEFAULT_CREDENTIALS
                    .iter()
                    .map(|(user, pass)| (user.to_string(), pass.to_string()))
                    .collect()
            }
            Err(e) => {
                error!("Failed to read credentials {}: {}", path.display(), e);
                return Err(e.into());
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            users,
        })
    }

    /// Check `password` against the stored password for `username`
    pub fn verify(&self, username: &str, password: &str) -> Result<(), AuthError> {
        match self.users.get(username) {
            Some(stored) if stored == password => Ok(()),
            Some(_) => Err(AuthError::InvalidPassword(username.to_string())),
            None => Err(AuthError::UserNotFound(username.to_string())),
        }
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    /// Registered usernames in sorted order
    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.users.keys().map(String::as_str)
    }

    pub fn add_user(&mut self, username: &str, password: &str) -> Result<(), AuthError> {
        if self.users.contains_key(username) {
            return Err(AuthError::UserAlreadyExists(username.to_string()));
        }
        self.users.insert(username.to_string(), password.to_string());
        Ok(())
    }

    pub fn remove_user(&mut self, username: &str) -> Result<(), AuthError> {
        self.users
            .remove(username)
            .map(|_| ())
            .ok_or_else(|| AuthError::UserNotFound(username.to_string()))
    }

    /// Persist the store, replacing the document atomically
    pub fn save(&self) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            create_directory(parent)?;
        }
        let document = serde_json::to_vec_pretty(&self.users)?;
        replace_atomically(&self.path, &document).map_err(|e| {
            error!("Failed to save credentials {}: {}", self.path.display(), e);
            AuthError::from(e)
        })
    }
}
