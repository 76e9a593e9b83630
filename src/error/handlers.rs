//! Error handlers
//!
//! Maps errors onto process exit codes for the command-line front end.

use crate::error::types::{AppError, AuthError, StorageError};
use log::error;

/// Log an application error
pub fn handle_error(err: &AppError) {
    error!("{}", err);
}

/// Convert error to a process exit code
pub fn error_to_exit_code(err: &AppError) -> u8 {
    match err {
        AppError::Storage(e) => match e {
            StorageError::InvalidPath(_) => 2,
            StorageError::NotFound(_) => 3,
            StorageError::PermissionDenied(_) => 4,
            StorageError::NotADirectory(_) => 5,
            StorageError::IoError(_) | StorageError::Metadata(_) => 6,
        },
        AppError::Auth(e) => match e {
            AuthError::NotAuthorized(_) | AuthError::ProtectedUser(_) => 4,
            AuthError::IoError(_) | AuthError::Metadata(_) => 6,
            _ => 7,
        },
        AppError::Config(_) => 8,
        AppError::IoError(_) => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_kinds_map_to_distinct_codes() {
        let invalid = AppError::from(StorageError::InvalidPath("../x".into()));
        let missing = AppError::from(StorageError::NotFound("x".into()));
        let denied = AppError::from(StorageError::PermissionDenied("x".into()));
        let io = AppError::from(StorageError::from(io::Error::other("disk")));

        assert_eq!(error_to_exit_code(&invalid), 2);
        assert_eq!(error_to_exit_code(&missing), 3);
        assert_eq!(error_to_exit_code(&denied), 4);
        assert_eq!(error_to_exit_code(&io), 6);
    }

    #[test]
    fn test_auth_failures() {
        let login = AppError::from(AuthError::InvalidPassword("alice".into()));
        let admin = AppError::from(AuthError::NotAuthorized("alice".into()));
        assert_eq!(error_to_exit_code(&login), 7);
        assert_eq!(error_to_exit_code(&admin), 4);
    }
}
