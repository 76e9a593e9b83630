//! Error types
//!
//! Defines domain-specific error types for each module of the file store.

use std::fmt;
use std::io;

/// Storage module errors
#[derive(Debug)]
pub enum StorageError {
    InvalidPath(String),
    NotFound(String),
    PermissionDenied(String),
    NotADirectory(String),
    IoError(io::Error),
    Metadata(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::InvalidPath(p) => write!(f, "Invalid path: {}", p),
            StorageError::NotFound(p) => write!(f, "Not found: {}", p),
            StorageError::PermissionDenied(p) => write!(f, "Permission denied: {}", p),
            StorageError::NotADirectory(p) => write!(f, "Not a directory: {}", p),
            StorageError::IoError(e) => write!(f, "IO error: {}", e),
            StorageError::Metadata(msg) => write!(f, "Metadata error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::IoError(error)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        StorageError::Metadata(error.to_string())
    }
}

/// Authentication and administration errors
#[derive(Debug)]
pub enum AuthError {
    InvalidUsername(String),
    InvalidPassword(String),
    UserNotFound(String),
    UserAlreadyExists(String),
    MalformedInput(String),
    NotAuthorized(String),
    ProtectedUser(String),
    IoError(io::Error),
    Metadata(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidUsername(u) => write!(f, "Invalid username: {}", u),
            AuthError::InvalidPassword(u) => write!(f, "Invalid password for user: {}", u),
            AuthError::UserNotFound(u) => write!(f, "User not found: {}", u),
            AuthError::UserAlreadyExists(u) => write!(f, "User already exists: {}", u),
            AuthError::MalformedInput(s) => write!(f, "Malformed input: {}", s),
            AuthError::NotAuthorized(u) => write!(f, "User {} is not authorized", u),
            AuthError::ProtectedUser(u) => write!(f, "User {} cannot be removed", u),
            AuthError::IoError(e) => write!(f, "IO error: {}", e),
            AuthError::Metadata(msg) => write!(f, "Credential store error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<io::Error> for AuthError {
    fn from(error: io::Error) -> Self {
        AuthError::IoError(error)
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        AuthError::Metadata(error.to_string())
    }
}

/// General error that encompasses all error types
#[derive(Debug)]
pub enum AppError {
    Storage(StorageError),
    Auth(AuthError),
    Config(config::ConfigError),
    IoError(io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Storage(e) => write!(f, "Storage error: {}", e),
            AppError::Auth(e) => write!(f, "Authentication error: {}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for AppError {}

impl From<StorageError> for AppError {
    fn from(error: StorageError) -> Self {
        AppError::Storage(error)
    }
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> Self {
        AppError::Auth(error)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(error: config::ConfigError) -> Self {
        AppError::Config(error)
    }
}

impl From<io::Error> for AppError {
    fn from(error: io::Error) -> Self {
        AppError::IoError(error)
    }
}
