//! File system storage management
//!
//! Handles path validation, the metadata index and the storage engine that
//! combines them with physical file I/O.

pub mod filesystem;
pub mod index;
pub mod operations;
pub mod results;
pub mod validation;

pub use index::{FileRecord, MetadataIndex};
pub use operations::FileStore;
pub use results::DirEntry;
pub use validation::{PathGuard, normalize, normalize_dir, validate_owner};
