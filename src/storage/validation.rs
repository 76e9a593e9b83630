//! Path validation
//!
//! Checks caller-supplied relative paths and owner identifiers before they are
//! joined onto the data root. Only the textual form is inspected; symlinks are
//! not resolved.

use crate::config::StoreConfig;
use crate::error::StorageError;

/// Separator used by relative paths inside an owner's namespace
pub const PATH_SEPARATOR: char = '/';

/// Validate a file path and return it with `.` segments removed.
///
/// Rejects empty paths, absolute and drive-prefixed paths, backslashes, NUL
/// bytes, empty segments, `..` segments and paths deeper than `max_depth`.
pub fn normalize(path: &str, max_depth: usize) -> Result<String, StorageError> {
    let normalized = normalize_segments(path, max_depth)?;
    if normalized.is_empty() {
        return Err(StorageError::InvalidPath(format!(
            "{path:?} does not name a file"
        )));
    }
    Ok(normalized)
}

/// Validate a directory path for browsing.
///
/// `"."` and `""` name the owner root and normalize to an empty string.
pub fn normalize_dir(path: &str, max_depth: usize) -> Result<String, StorageError> {
    if path.is_empty() {
        return Ok(String::new());
    }
    normalize_segments(path, max_depth)
}

/// Validate an owner identifier, which becomes a single directory name.
pub fn validate_owner(owner: &str) -> Result<(), StorageError> {
    if owner.trim().is_empty()
        || owner == "."
        || owner == ".."
        || owner.contains([PATH_SEPARATOR, '\\', '\0', ':'])
    {
        return Err(StorageError::InvalidPath(format!(
            "invalid owner identifier {owner:?}"
        )));
    }
    Ok(())
}

/// Path checks bound to one store: its depth limit and the names in the data
/// root that belong to the sidecar documents.
#[derive(Debug, Clone)]
pub struct PathGuard {
    max_depth: usize,
    reserved: Vec<String>,
}

impl PathGuard {
    pub fn new(max_depth: usize, reserved: Vec<String>) -> Self {
        Self {
            max_depth,
            reserved,
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.max_path_depth, config.reserved_names())
    }

    /// See [`normalize`]
    pub fn file_path(&self, path: &str) -> Result<String, StorageError> {
        normalize(path, self.max_depth)
    }

    /// See [`normalize_dir`]
    pub fn dir_path(&self, path: &str) -> Result<String, StorageError> {
        normalize_dir(path, self.max_depth)
    }

    /// [`validate_owner`], additionally refusing reserved names
    pub fn owner(&self, owner: &str) -> Result<(), StorageError> {
        validate_owner(owner)?;
        if self.reserved.iter().any(|name| name == owner) {
            return Err(StorageError::InvalidPath(format!(
                "owner identifier {owner:?} is reserved"
            )));
        }
        Ok(())
    }
}

fn normalize_segments(path: &str, max_depth: usize) -> Result<String, StorageError> {
    let reject = |reason: &str| StorageError::InvalidPath(format!("{path:?}: {reason}"));

    if path.is_empty() {
        return Err(reject("empty path"));
    }
    if path.contains('\0') {
        return Err(reject("contains NUL byte"));
    }
    if path.contains('\\') {
        return Err(reject("backslash separators are not allowed"));
    }
    if path.starts_with(PATH_SEPARATOR) {
        return Err(reject("absolute paths are not allowed"));
    }
    if has_drive_prefix(path) {
        return Err(reject("drive prefixes are not allowed"));
    }

    let mut segments = Vec::new();
    for segment in path.split(PATH_SEPARATOR) {
        match segment {
            "" => return Err(reject("empty path segment")),
            ".." => return Err(reject("parent directory segment")),
            "." => continue,
            s => segments.push(s),
        }
    }

    if segments.len() > max_depth {
        return Err(reject("path too deep"));
    }

    Ok(segments.join("/"))
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
