//! Metadata index
//!
//! In-memory owner → relative path → [`FileRecord`] map mirrored by the JSON
//! sidecar document. The whole document is rewritten after every mutation.

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::storage::filesystem::{backing_path, replace_atomically};
use crate::storage::validation::PathGuard;

/// Suffix appended to a sidecar document that could not be parsed at all
pub const QUARANTINE_SUFFIX: &str = ".corrupt";

/// Metadata describing one stored file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Physical location of the backing file
    pub path: String,
    /// Content length in bytes at the last write
    pub size: u64,
    /// Creation time in UNIX seconds; never changes after creation
    pub created: f64,
    /// Time of the last successful content write in UNIX seconds
    pub modified: f64,
    pub owner: String,
    /// Blocks update and delete when set
    #[serde(rename = "readonly", default)]
    pub read_only: bool,
}

type OwnerFiles = BTreeMap<String, FileRecord>;

/// Two-level map of every record known to the store
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetadataIndex {
    owners: BTreeMap<String, OwnerFiles>,
}

impl MetadataIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, owner: &str, relative_path: &str) -> Option<&FileRecord> {
        self.owners.get(owner)?.get(relative_path)
    }

    pub fn get_mut(&mut self, owner: &str, relative_path: &str) -> Option<&mut FileRecord> {
        self.owners.get_mut(owner)?.get_mut(relative_path)
    }

    /// Insert or replace a record, returning the previous one
    pub fn insert(
        &mut self,
        owner: &str,
        relative_path: &str,
        record: FileRecord,
    ) -> Option<FileRecord> {
        self.owners
            .entry(owner.to_string())
            .or_default()
            .insert(relative_path.to_string(), record)
    }

    /// Remove a record. The owner bucket is dropped once it becomes empty.
    pub fn remove(&mut self, owner: &str, relative_path: &str) -> Option<FileRecord> {
        let files = self.owners.get_mut(owner)?;
        let removed = files.remove(relative_path);
        if files.is_empty() {
            self.owners.remove(owner);
        }
        removed
    }

    /// Remove every record filed under `owner`
    pub fn remove_owner(&mut self, owner: &str) -> usize {
        self.owners.remove(owner).map_or(0, |files| files.len())
    }

    pub fn contains_owner(&self, owner: &str) -> bool {
        self.owners.contains_key(owner)
    }

    /// Owners with at least one record, in sorted order
    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.owners.keys().map(String::as_str)
    }

    /// Records of `owner` sorted by relative path
    pub fn files_of<'a>(
        &'a self,
        owner: &str,
    ) -> impl Iterator<Item = (&'a str, &'a FileRecord)> + 'a {
        self.owners
            .get(owner)
            .into_iter()
            .flat_map(|files| files.iter().map(|(path, record)| (path.as_str(), record)))
    }

    /// Total number of records across all owners
    pub fn file_count(&self) -> usize {
        self.owners.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Load the sidecar document at `meta_path`.
    ///
    /// A missing or blank document yields an empty index. A document that is
    /// not a JSON object is moved aside to `<name>.corrupt`. Individual entries
    /// that fail validation are dropped with a warning; the rest are kept.
    /// The `path` of each record is re-derived from `root`.
    pub fn load(meta_path: &Path, root: &Path, guard: &PathGuard) -> Self {
        let data = match fs::read_to_string(meta_path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No metadata at {}, starting empty", meta_path.display());
                return Self::new();
            }
            Err(e) => {
                error!("Failed to read metadata {}: {}", meta_path.display(), e);
                return Self::new();
            }
        };

        if data.trim().is_empty() {
            return Self::new();
        }

        let owners = match serde_json::from_str::<Value>(&data) {
            Ok(Value::Object(owners)) => owners,
            Ok(_) => {
                error!(
                    "Metadata {} is not a JSON object, starting empty",
                    meta_path.display()
                );
                quarantine(meta_path);
                return Self::new();
            }
            Err(e) => {
                error!("Failed to parse metadata {}: {}", meta_path.display(), e);
                quarantine(meta_path);
                return Self::new();
            }
        };

        let mut index = Self::new();
        let mut dropped = 0usize;

        for (owner, files) in owners {
            if let Err(e) = guard.owner(&owner) {
                warn!("Dropping metadata bucket {:?}: {}", owner, e);
                dropped += 1;
                continue;
            }
            let Value::Object(files) = files else {
                warn!("Dropping metadata bucket {:?}: not an object", owner);
                dropped += 1;
                continue;
            };

            for (relative_path, raw) in files {
                match parse_entry(&owner, &relative_path, raw, guard) {
                    Ok(mut record) => {
                        record.path = backing_path(root, &owner, &relative_path)
                            .to_string_lossy()
                            .to_string();
                        index.insert(&owner, &relative_path, record);
                    }
                    Err(reason) => {
                        warn!(
                            "Dropping metadata entry {}/{}: {}",
                            owner, relative_path, reason
                        );
                        dropped += 1;
                    }
                }
            }
        }

        info!(
            "Loaded metadata {}: {} files for {} owners ({} entries dropped)",
            meta_path.display(),
            index.file_count(),
            index.owners.len(),
            dropped
        );

        index
    }

    /// Serialize the whole index and replace the sidecar document
    pub fn save(&self, meta_path: &Path) -> Result<(), StorageError> {
        let document = serde_json::to_vec_pretty(self)?;
        replace_atomically(meta_path, &document).map_err(|e| {
            error!("Failed to save metadata {}: {}", meta_path.display(), e);
            StorageError::from(e)
        })?;
        debug!(
            "Saved metadata {} ({} files)",
            meta_path.display(),
            self.file_count()
        );
        Ok(())
    }
}

fn parse_entry(
    owner: &str,
    relative_path: &str,
    raw: Value,
    guard: &PathGuard,
) -> Result<FileRecord, String> {
    match guard.file_path(relative_path) {
        Ok(normalized) if normalized == relative_path => {}
        Ok(_) => return Err("path is not in normal form".into()),
        Err(e) => return Err(e.to_string()),
    }

    let record: FileRecord = serde_json::from_value(raw).map_err(|e| e.to_string())?;

    if record.owner != owner {
        return Err(format!("owner field {:?} does not match bucket", record.owner));
    }

    Ok(record)
}

fn quarantine(meta_path: &Path) {
    let mut name = meta_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(QUARANTINE_SUFFIX);
    let target: PathBuf = meta_path.with_file_name(name);

    match fs::rename(meta_path, &target) {
        Ok(()) => warn!(
            "Moved unreadable metadata {} to {}",
            meta_path.display(),
            target.display()
        ),
        Err(e) => error!(
            "Failed to quarantine metadata {}: {}",
            meta_path.display(),
            e
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn guard() -> PathGuard {
        PathGuard::from_config(&crate::config::StoreConfig::default())
    }

    fn record(owner: &str, size: u64) -> FileRecord {
        FileRecord {
            path: String::new(),
            size,
            created: 1.5,
            modified: 2.5,
            owner: owner.to_string(),
            read_only: false,
        }
    }

    #[test]
    fn test_remove_drops_empty_owner_bucket() {
        let mut index = MetadataIndex::new();
        index.insert("alice", "a.txt", record("alice", 1));
        index.insert("alice", "b.txt", record("alice", 2));

        assert!(index.remove("alice", "a.txt").is_some());
        assert!(index.contains_owner("alice"));

        assert!(index.remove("alice", "b.txt").is_some());
        assert!(!index.contains_owner("alice"));
        assert!(index.is_empty());
    }

    #[test]
    fn test_remove_missing_record_leaves_index_unchanged() {
        let mut index = MetadataIndex::new();
        index.insert("alice", "a.txt", record("alice", 1));
        let before = index.clone();

        assert!(index.remove("alice", "nope.txt").is_none());
        assert!(index.remove("bob", "a.txt").is_none());
        assert_eq!(index, before);
    }

    #[test]
    fn test_load_missing_or_blank_document_is_empty() {
        let dir = TempDir::new().unwrap();
        let meta = dir.path().join("fs_meta.json");
        assert!(MetadataIndex::load(&meta, dir.path(), &guard()).is_empty());

        fs::write(&meta, "  \n").unwrap();
        assert!(MetadataIndex::load(&meta, dir.path(), &guard()).is_empty());
    }

    #[test]
    fn test_save_then_load_uses_sidecar_field_names() {
        let dir = TempDir::new().unwrap();
        let meta = dir.path().join("fs_meta.json");
        let mut index = MetadataIndex::new();
        let mut ro = record("alice", 5);
        ro.read_only = true;
        index.insert("alice", "docs/a.txt", ro);

        index.save(&meta).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&meta).unwrap()).unwrap();
        let entry = &raw["alice"]["docs/a.txt"];
        assert_eq!(entry["size"], 5);
        assert_eq!(entry["readonly"], true);
        assert_eq!(entry["owner"], "alice");
        assert!(entry["created"].is_number());
        assert!(entry["modified"].is_number());

        let loaded = MetadataIndex::load(&meta, dir.path(), &guard());
        let loaded_record = loaded.get("alice", "docs/a.txt").unwrap();
        assert!(loaded_record.read_only);
        assert_eq!(loaded_record.created, 1.5);
        assert_eq!(
            PathBuf::from(&loaded_record.path),
            dir.path().join("alice").join("docs/a.txt")
        );
    }

    #[test]
    fn test_malformed_document_is_quarantined() {
        let dir = TempDir::new().unwrap();
        let meta = dir.path().join("fs_meta.json");
        fs::write(&meta, "{ not json").unwrap();

        let index = MetadataIndex::load(&meta, dir.path(), &guard());

        assert!(index.is_empty());
        assert!(!meta.exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("fs_meta.json.corrupt")).unwrap(),
            "{ not json"
        );
    }

    #[test]
    fn test_invalid_entries_are_dropped_individually() {
        let dir = TempDir::new().unwrap();
        let meta = dir.path().join("fs_meta.json");
        let document = serde_json::json!({
            "alice": {
                "good.txt": {"path": "x", "size": 3, "created": 1.0, "modified": 2.0,
                             "owner": "alice", "readonly": false},
                "../escape.txt": {"path": "x", "size": 3, "created": 1.0, "modified": 2.0,
                                  "owner": "alice", "readonly": false},
                "wrong_owner.txt": {"path": "x", "size": 3, "created": 1.0, "modified": 2.0,
                                    "owner": "bob", "readonly": false},
                "bad_size.txt": {"path": "x", "size": "big", "created": 1.0, "modified": 2.0,
                                 "owner": "alice", "readonly": false}
            },
            "bob": "not a bucket",
            "fs_meta.json.tmp": {
                "a.txt": {"path": "x", "size": 1, "created": 1.0, "modified": 1.0,
                          "owner": "fs_meta.json.tmp", "readonly": false}
            },
            "../root": {}
        });
        fs::write(&meta, document.to_string()).unwrap();

        let index = MetadataIndex::load(&meta, dir.path(), &guard());

        assert_eq!(index.file_count(), 1);
        assert!(index.get("alice", "good.txt").is_some());
        assert!(!index.contains_owner("bob"));
        assert!(!index.contains_owner("fs_meta.json.tmp"));
    }
}
