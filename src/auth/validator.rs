//! Authentication validator
//!
//! Validates usernames and passwords and turns a successful login into a
//! [`Session`].

use log::info;

use super::credentials::CredentialStore;
use crate::config::StoreConfig;
use crate::error::AuthError;
use crate::session::{Role, Session};
use crate::storage::PathGuard;

/// Performs basic input sanitation to check for malicious or malformed usernames/passwords.
pub fn is_valid_input(input: &str, max_length: usize) -> bool {
    !input.trim().is_empty() && input.len() <= max_length && !input.contains(['\r', '\n', '\0'])
}

/// Checks that `username` is well formed. Usernames double as directory names
/// in the data root, so the sidecar names and their siblings are refused.
pub fn validate_username(username: &str, config: &StoreConfig) -> Result<(), AuthError> {
    if !is_valid_input(username, config.max_username_length) {
        return Err(AuthError::MalformedInput("Invalid username format".into()));
    }

    if username.contains(['@', '#', ',', '%'])
        || username.starts_with(char::is_numeric)
        || PathGuard::from_config(config).owner(username).is_err()
    {
        return Err(AuthError::InvalidUsername(username.to_string()));
    }

    Ok(())
}

/// Authenticates `username`/`password` against `credentials`.
///
/// The configured guest user is let in with an empty password as a regular
/// user, without consulting the credential store.
pub fn login(
    credentials: &CredentialStore,
    username: &str,
    password: &str,
    config: &StoreConfig,
) -> Result<Session, AuthError> {
    validate_username(username, config)?;

    if config.guest_enabled() && username == config.guest_user && password.is_empty() {
        info!("Guest login as {}", username);
        return Ok(Session::new(username, Role::User));
    }

    if !is_valid_input(password, config.max_username_length) {
        return Err(AuthError::MalformedInput("Invalid password format".into()));
    }

    credentials.verify(username, password)?;
    Ok(Session::for_user(username, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn credentials(dir: &TempDir) -> CredentialStore {
        CredentialStore::load(&dir.path().join("users.json")).unwrap()
    }

    #[test]
    fn test_login_assigns_roles() {
        let dir = TempDir::new().unwrap();
        let creds = credentials(&dir);
        let config = StoreConfig::default();

        let user = login(&creds, "user1", "1234", &config).unwrap();
        assert_eq!(user.username(), "user1");
        assert_eq!(user.role(), Role::User);

        let admin = login(&creds, "admin", "admin", &config).unwrap();
        assert_eq!(admin.role(), Role::Admin);
    }

    #[test]
    fn test_login_rejects_bad_password() {
        let dir = TempDir::new().unwrap();
        let creds = credentials(&dir);
        let config = StoreConfig::default();

        assert!(matches!(
            login(&creds, "user1", "nope", &config),
            Err(AuthError::InvalidPassword(_))
        ));
        assert!(matches!(
            login(&creds, "user1", "", &config),
            Err(AuthError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_guest_logs_in_without_password() {
        let dir = TempDir::new().unwrap();
        let creds = credentials(&dir);
        let config = StoreConfig::default();

        let guest = login(&creds, "guest", "", &config).unwrap();
        assert_eq!(guest.username(), "guest");
        assert_eq!(guest.role(), Role::User);
        assert!(guest.require_admin().is_err());

        assert!(matches!(
            login(&creds, "guest", "wrong", &config),
            Err(AuthError::UserNotFound(_))
        ));
    }

    #[test]
    fn test_guest_login_can_be_disabled() {
        let dir = TempDir::new().unwrap();
        let creds = credentials(&dir);
        let config = StoreConfig {
            guest_user: String::new(),
            ..StoreConfig::default()
        };

        assert!(matches!(
            login(&creds, "guest", "", &config),
            Err(AuthError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_usernames_that_are_not_directory_names_are_rejected() {
        let config = StoreConfig::default();
        for name in [
            "..",
            "a/b",
            "1user",
            "fs_meta.json",
            "fs_meta.json.tmp",
            "users.json.corrupt",
            "bad#name",
        ] {
            assert!(
                matches!(
                    validate_username(name, &config),
                    Err(AuthError::InvalidUsername(_))
                ),
                "{name} should be rejected"
            );
        }
        assert!(matches!(
            validate_username("a\nb", &config),
            Err(AuthError::MalformedInput(_))
        ));
    }
}
