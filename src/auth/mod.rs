//! Authentication system
//!
//! Handles the credential store and login validation.

pub mod credentials;
pub mod validator;

pub use credentials::CredentialStore;
pub use validator::{login, validate_username};
