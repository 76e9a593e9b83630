//! Administrative operations implementation
//!
//! Every operation takes the caller's [`Session`] and fails with
//! [`AuthError::NotAuthorized`] unless it carries the admin role.

use log::info;
use std::collections::BTreeSet;

use crate::auth::{CredentialStore, validate_username};
use crate::auth::validator::is_valid_input;
use crate::config::StoreConfig;
use crate::error::{AppError, AuthError};
use crate::session::Session;
use crate::storage::{FileRecord, FileStore};

/// Per-owner usage figures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerSummary {
    pub owner: String,
    pub file_count: usize,
    pub total_bytes: u64,
}

/// Usage for every registered user and every owner with stored files,
/// sorted by name.
pub fn owner_summaries(
    store: &FileStore,
    credentials: &CredentialStore,
    session: &Session,
) -> Result<Vec<OwnerSummary>, AppError> {
    session.require_admin()?;

    let names: BTreeSet<&str> = credentials
        .usernames()
        .chain(store.index().owners())
        .collect();

    Ok(names
        .into_iter()
        .map(|owner| {
            let (file_count, total_bytes) = store
                .index()
                .files_of(owner)
                .fold((0usize, 0u64), |(count, bytes), (_, record)| {
                    (count + 1, bytes + record.size)
                });
            OwnerSummary {
                owner: owner.to_string(),
                file_count,
                total_bytes,
            }
        })
        .collect())
}

/// Records filed under another owner
pub fn owner_files(
    store: &FileStore,
    session: &Session,
    owner: &str,
) -> Result<Vec<(String, FileRecord)>, AppError> {
    session.require_admin()?;
    Ok(store.owner_files(owner))
}

/// Read a file from another owner's namespace
pub fn read_owner_file(
    store: &FileStore,
    session: &Session,
    owner: &str,
    filename: &str,
) -> Result<String, AppError> {
    session.require_admin()?;
    info!(
        "Admin {} reading {}/{}",
        session.username(),
        owner,
        filename
    );
    Ok(store.read(filename, owner)?)
}

/// Register a new account
pub fn add_user(
    credentials: &mut CredentialStore,
    session: &Session,
    config: &StoreConfig,
    username: &str,
    password: &str,
) -> Result<(), AppError> {
    session.require_admin()?;
    validate_username(username, config)?;
    if !is_valid_input(password, config.max_username_length) {
        return Err(AuthError::MalformedInput("Invalid password format".into()).into());
    }

    credentials.add_user(username, password)?;
    credentials.save()?;

    info!("Admin {} added user {}", session.username(), username);
    Ok(())
}

/// Remove an account together with all of its files.
///
/// The configured administrator cannot be removed. Files are purged before
/// the credential is dropped, so a failed purge can be retried. A name with
/// files left behind but no credential is still purged. Returns the number of
/// file records purged.
pub fn remove_user(
    store: &mut FileStore,
    credentials: &mut CredentialStore,
    session: &Session,
    config: &StoreConfig,
    username: &str,
) -> Result<usize, AppError> {
    session.require_admin()?;
    if username == config.admin_user {
        return Err(AuthError::ProtectedUser(username.to_string()).into());
    }

    let registered = credentials.contains(username);
    if !registered && !store.owner_exists(username) {
        return Err(AuthError::UserNotFound(username.to_string()).into());
    }

    let purged = store.purge_owner(username)?;
    if registered {
        credentials.remove_user(username)?;
        credentials.save()?;
    }

    info!(
        "Admin {} removed user {} ({} files)",
        session.username(),
        username,
        purged
    );
    Ok(purged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::session::Role;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        config: StoreConfig,
        store: FileStore,
        credentials: CredentialStore,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::with_data_dir(dir.path());
        let store = FileStore::open(&config).unwrap();
        let credentials = CredentialStore::load(&config.users_path()).unwrap();
        Fixture {
            _dir: dir,
            config,
            store,
            credentials,
        }
    }

    fn admin() -> Session {
        Session::new("admin", Role::Admin)
    }

    #[test]
    fn test_non_admin_is_refused() {
        let f = fixture();
        let alice = Session::new("alice", Role::User);

        assert!(matches!(
            owner_summaries(&f.store, &f.credentials, &alice),
            Err(AppError::Auth(AuthError::NotAuthorized(_)))
        ));
        assert!(matches!(
            read_owner_file(&f.store, &alice, "user1", "a.txt"),
            Err(AppError::Auth(AuthError::NotAuthorized(_)))
        ));
    }

    #[test]
    fn test_summaries_include_users_without_files() {
        let mut f = fixture();
        f.store.create("a.txt", "abc", "user1", false).unwrap();
        f.store.create("b/c.txt", "de", "user1", false).unwrap();

        let summaries = owner_summaries(&f.store, &f.credentials, &admin()).unwrap();

        assert_eq!(
            summaries,
            vec![
                OwnerSummary { owner: "admin".into(), file_count: 0, total_bytes: 0 },
                OwnerSummary { owner: "user1".into(), file_count: 2, total_bytes: 5 },
                OwnerSummary { owner: "user2".into(), file_count: 0, total_bytes: 0 },
            ]
        );
    }

    #[test]
    fn test_admin_reads_other_owner() {
        let mut f = fixture();
        f.store.create("notes.txt", "private", "user1", false).unwrap();

        let content = read_owner_file(&f.store, &admin(), "user1", "notes.txt").unwrap();
        assert_eq!(content, "private");

        let files = owner_files(&f.store, &admin(), "user1").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].0, "notes.txt");

        assert!(matches!(
            read_owner_file(&f.store, &admin(), "user1", "missing.txt"),
            Err(AppError::Storage(StorageError::NotFound(_)))
        ));
    }

    #[test]
    fn test_remove_user_purges_files_and_credentials() {
        let mut f = fixture();
        f.store.create("ro.txt", "x", "user2", true).unwrap();

        let purged = remove_user(
            &mut f.store,
            &mut f.credentials,
            &admin(),
            &f.config,
            "user2",
        )
        .unwrap();

        assert_eq!(purged, 1);
        assert!(!f.credentials.contains("user2"));
        assert!(!f.store.index().contains_owner("user2"));
        let reloaded = CredentialStore::load(&f.config.users_path()).unwrap();
        assert!(!reloaded.contains("user2"));
    }

    #[test]
    fn test_remove_user_purges_files_without_credential() {
        let mut f = fixture();
        f.store.create("left.txt", "x", "user2", false).unwrap();
        f.credentials.remove_user("user2").unwrap();
        f.credentials.save().unwrap();

        let purged = remove_user(
            &mut f.store,
            &mut f.credentials,
            &admin(),
            &f.config,
            "user2",
        )
        .unwrap();

        assert_eq!(purged, 1);
        assert!(!f.store.owner_exists("user2"));
        assert!(!f.config.data_dir_path().join("user2").exists());
    }

    #[test]
    fn test_remove_unknown_user_is_not_found() {
        let mut f = fixture();
        assert!(matches!(
            remove_user(&mut f.store, &mut f.credentials, &admin(), &f.config, "ghost"),
            Err(AppError::Auth(AuthError::UserNotFound(_)))
        ));
    }

    #[test]
    fn test_failed_purge_keeps_credential() {
        let mut f = fixture();
        f.credentials.save().unwrap();
        f.store.create("a.txt", "x", "user1", false).unwrap();
        let meta = f.config.meta_path();
        std::fs::remove_file(&meta).unwrap();
        std::fs::create_dir(&meta).unwrap();

        assert!(matches!(
            remove_user(&mut f.store, &mut f.credentials, &admin(), &f.config, "user1"),
            Err(AppError::Storage(_))
        ));
        assert!(CredentialStore::load(&f.config.users_path())
            .unwrap()
            .contains("user1"));

        std::fs::remove_dir(&meta).unwrap();
        remove_user(&mut f.store, &mut f.credentials, &admin(), &f.config, "user1").unwrap();
        assert!(!f.credentials.contains("user1"));
        assert!(!f.store.owner_exists("user1"));
    }

    #[test]
    fn test_admin_account_is_protected() {
        let mut f = fixture();
        assert!(matches!(
            remove_user(&mut f.store, &mut f.credentials, &admin(), &f.config, "admin"),
            Err(AppError::Auth(AuthError::ProtectedUser(_)))
        ));
        assert!(f.credentials.contains("admin"));
    }

    #[test]
    fn test_add_user_validates_and_persists() {
        let mut f = fixture();
        add_user(&mut f.credentials, &admin(), &f.config, "carol", "pw").unwrap();
        for name in ["../x", "fs_meta.json.tmp", "users.json.corrupt"] {
            assert!(
                matches!(
                    add_user(&mut f.credentials, &admin(), &f.config, name, "pw"),
                    Err(AppError::Auth(AuthError::InvalidUsername(_)))
                ),
                "{name} should be rejected"
            );
        }

        let reloaded = CredentialStore::load(&f.config.users_path()).unwrap();
        assert!(reloaded.verify("carol", "pw").is_ok());
    }
}
