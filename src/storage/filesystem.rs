//! File system operations
//!
//! Leaf filesystem primitives used by the storage engine and the sidecar
//! documents.

use log::{debug, error};
use std::fs::{self, File, Metadata};
use std::io::{Result, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Suffix of the temporary sibling written by [`replace_atomically`]
pub const TEMP_SUFFIX: &str = ".tmp";

/// Physical location of `relative_path` in `owner`'s subtree under `root`.
///
/// Both arguments must already have passed path validation.
pub fn backing_path(root: &Path, owner: &str, relative_path: &str) -> PathBuf {
    let mut path = root.join(owner);
    for segment in relative_path.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path
}

/// Create a directory and any missing parents
pub fn create_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
}

/// Check if file exists
pub fn file_exists(path: &Path) -> bool {
    path.is_file()
}

/// Check if directory exists
pub fn directory_exists(path: &Path) -> bool {
    path.is_dir()
}

/// Write `content` to `path`, creating missing parent directories first.
///
/// Returns the modification time of the written file.
pub fn write_file(path: &Path, content: &[u8]) -> Result<f64> {
    if let Some(parent) = path.parent() {
        create_directory(parent)?;
    }
    fs::write(path, content)?;
    let metadata = fs::metadata(path)?;
    Ok(modified_secs(&metadata))
}

/// Remove a file; a missing file is not an error.
///
/// Returns whether a file was actually removed.
pub fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Remove the now-empty directories above a deleted file, bottom up.
///
/// Stops at the first directory that still has entries and never climbs above
/// `stop_at`, which is itself removed when empty. Returns the number of
/// directories removed.
pub fn prune_empty_dirs(deleted: &Path, stop_at: &Path) -> usize {
    let mut removed = 0;
    for dir in deleted.ancestors().skip(1) {
        if !dir.starts_with(stop_at) {
            break;
        }
        if let Err(e) = fs::remove_dir(dir) {
            debug!("Stopped pruning at {}: {}", dir.display(), e);
            break;
        }
        removed += 1;
    }
    removed
}

/// Replace `path` with `content` by writing a temporary sibling and renaming it.
///
/// Readers observe either the previous document or the complete new one.
pub fn replace_atomically(path: &Path, content: &[u8]) -> Result<()> {
    let temp_path = temp_path_for(path);

    let write_temp = || -> Result<()> {
        let mut temp_file = File::create(&temp_path)?;
        temp_file.write_all(content)?;
        temp_file.sync_all()
    };

    if let Err(e) = write_temp() {
        error!("Failed to write temporary file {}: {}", temp_path.display(), e);
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        error!(
            "Failed to rename {} -> {}: {}",
            temp_path.display(),
            path.display(),
            e
        );
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    debug!("Replaced {} ({} bytes)", path.display(), content.len());
    Ok(())
}

/// Modification time as fractional UNIX seconds, 0.0 when unavailable
pub fn modified_secs(metadata: &Metadata) -> f64 {
    metadata.modified().map(system_time_secs).unwrap_or(0.0)
}

fn system_time_secs(time: SystemTime) -> f64 {
    time.duration_since(UNIX_EPOCH)
        .map(|dur| dur.as_secs_f64())
        .unwrap_or(0.0)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}
