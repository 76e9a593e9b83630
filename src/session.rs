//! Module `session`
//!
//! Explicit context for an authenticated caller. Storage calls are made with
//! [`Session::username`] as the owner key; administrative operations check
//! [`Session::require_admin`] first.

use crate::config::StoreConfig;
use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    username: String,
    role: Role,
}

impl Session {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    /// Session for `username`, with the admin role when it matches the
    /// configured administrator.
    pub fn for_user(username: &str, config: &StoreConfig) -> Self {
        let role = if username == config.admin_user {
            Role::Admin
        } else {
            Role::User
        };
        Self::new(username, role)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AuthError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AuthError::NotAuthorized(self.username.clone()))
        }
    }
}
