//! RAX file store
//!
//! Per-user file storage on a real directory tree. Files live under
//! `<data_dir>/<owner>/<path>`. Their size, timestamps, owner and read-only
//! flag are tracked in a JSON sidecar that is rewritten after every mutation.

pub mod admin;
pub mod auth;
pub mod config;
pub mod error;
pub mod session;
pub mod storage;
pub mod utils;

pub use config::StoreConfig;
pub use error::{AppError, AuthError, StorageError};
pub use session::{Role, Session};
pub use storage::{DirEntry, FileRecord, FileStore};
