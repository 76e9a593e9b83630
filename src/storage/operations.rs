//! Storage operations
//!
//! The storage engine: every public operation validates its arguments, performs
//! the physical I/O under `<root>/<owner>/<path>` and then rewrites the
//! metadata sidecar. A caller can only reach records filed under the owner
//! identifier it passes in.

use log::{debug, error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::StoreConfig;
use crate::error::StorageError;
use crate::storage::filesystem::{
    backing_path, create_directory, directory_exists, file_exists, modified_secs,
    prune_empty_dirs, remove_file_if_exists, write_file,
};
use crate::storage::index::{FileRecord, MetadataIndex};
use crate::storage::results::DirEntry;
use crate::storage::validation::PathGuard;

/// Single-owner file storage over a real directory tree
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    meta_path: PathBuf,
    guard: PathGuard,
    index: MetadataIndex,
}

impl FileStore {
    /// Open the store described by `config`, creating the data root if needed
    /// and loading the metadata sidecar.
    pub fn open(config: &StoreConfig) -> Result<Self, StorageError> {
        let root = config.data_dir_path();
        if let Err(e) = create_directory(&root) {
            error!("Failed to create data root {}: {}", root.display(), e);
            return Err(e.into());
        }

        let meta_path = config.meta_path();
        let guard = PathGuard::from_config(config);
        let index = MetadataIndex::load(&meta_path, &root, &guard);

        info!(
            "Opened file store at {} ({} files)",
            root.display(),
            index.file_count()
        );

        Ok(Self {
            root,
            meta_path,
            guard,
            index,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta_path(&self) -> &Path {
        &self.meta_path
    }

    /// Read-only view of the metadata index
    pub fn index(&self) -> &MetadataIndex {
        &self.index
    }

    /// Create (or overwrite) `filename` in `owner`'s namespace.
    ///
    /// An existing read-only record cannot be overwritten. A partially written
    /// file is not rolled back when a later step fails.
    pub fn create(
        &mut self,
        filename: &str,
        content: &str,
        owner: &str,
        read_only: bool,
    ) -> Result<(), StorageError> {
        let (relative_path, path) = self
            .resolve(owner, filename)
            .inspect_err(|e| warn!("Rejected create for {}: {}", owner, e))?;

        if self
            .index
            .get(owner, &relative_path)
            .is_some_and(|record| record.read_only)
        {
            warn!("Refusing to overwrite read-only file {}/{}", owner, relative_path);
            return Err(StorageError::PermissionDenied(relative_path));
        }

        let written_at = write_file(&path, content.as_bytes()).map_err(|e| {
            error!("Failed to write {}: {}", path.display(), e);
            StorageError::from(e)
        })?;

        let record = FileRecord {
            path: path.to_string_lossy().to_string(),
            size: content.len() as u64,
            created: written_at,
            modified: written_at,
            owner: owner.to_string(),
            read_only,
        };
        self.index.insert(owner, &relative_path, record);
        self.persist()?;

        info!(
            "Created {}/{} ({} bytes{})",
            owner,
            relative_path,
            content.len(),
            if read_only { ", read-only" } else { "" }
        );
        Ok(())
    }

    /// Read the textual content of `filename` from `user`'s namespace.
    pub fn read(&self, filename: &str, user: &str) -> Result<String, StorageError> {
        let (relative_path, path) = self.resolve(user, filename)?;

        if self.index.get(user, &relative_path).is_none() {
            return Err(StorageError::NotFound(relative_path));
        }

        if !file_exists(&path) {
            warn!(
                "Record {}/{} has no backing file at {}",
                user,
                relative_path,
                path.display()
            );
            return Err(StorageError::NotFound(relative_path));
        }

        fs::read_to_string(&path).map_err(|e| {
            error!("Failed to read {}: {}", path.display(), e);
            StorageError::from(e)
        })
    }

    /// Replace the content of an existing, writable file.
    ///
    /// `created` is preserved; `size` and `modified` are refreshed.
    pub fn update(
        &mut self,
        filename: &str,
        new_content: &str,
        user: &str,
    ) -> Result<(), StorageError> {
        let (relative_path, path) = self.resolve(user, filename)?;

        let record = self
            .index
            .get(user, &relative_path)
            .ok_or_else(|| StorageError::NotFound(relative_path.clone()))?;

        if record.read_only {
            warn!("Refusing to update read-only file {}/{}", user, relative_path);
            return Err(StorageError::PermissionDenied(relative_path));
        }

        if !file_exists(&path) {
            warn!("Cannot update {}/{}: backing file missing", user, relative_path);
            return Err(StorageError::NotFound(relative_path));
        }

        let written_at = write_file(&path, new_content.as_bytes()).map_err(|e| {
            error!("Failed to rewrite {}: {}", path.display(), e);
            StorageError::from(e)
        })?;

        if let Some(record) = self.index.get_mut(user, &relative_path) {
            record.size = new_content.len() as u64;
            record.modified = written_at;
        }
        self.persist()?;

        info!(
            "Updated {}/{} ({} bytes)",
            user,
            relative_path,
            new_content.len()
        );
        Ok(())
    }

    /// Delete a writable file and its record.
    ///
    /// A backing file that is already gone is tolerated. Directories left
    /// empty by the removal are pruned up to and including the owner root.
    pub fn delete(&mut self, filename: &str, user: &str) -> Result<(), StorageError> {
        let (relative_path, path) = self.resolve(user, filename)?;

        let record = self
            .index
            .get(user, &relative_path)
            .ok_or_else(|| StorageError::NotFound(relative_path.clone()))?;

        if record.read_only {
            warn!("Refusing to delete read-only file {}/{}", user, relative_path);
            return Err(StorageError::PermissionDenied(relative_path));
        }

        match remove_file_if_exists(&path) {
            Ok(true) => {}
            Ok(false) => warn!(
                "Backing file for {}/{} was already missing",
                user, relative_path
            ),
            Err(e) => {
                error!("Failed to delete {}: {}", path.display(), e);
                return Err(e.into());
            }
        }

        let pruned = prune_empty_dirs(&path, &self.root.join(user));
        if pruned > 0 {
            debug!("Pruned {} empty directories under {}", pruned, user);
        }

        self.index.remove(user, &relative_path);
        self.persist()?;

        info!("Deleted {}/{}", user, relative_path);
        Ok(())
    }

    /// List the immediate children of `path` inside `user`'s subtree.
    ///
    /// A directory that does not exist yields an empty listing. Entries are
    /// sorted with directories first, then by name.
    pub fn browse(&self, user: &str, path: &str) -> Result<Vec<DirEntry>, StorageError> {
        self.guard.owner(user)?;
        let relative_path = self
            .guard
            .dir_path(path)
            .inspect_err(|e| warn!("Rejected browse for {}: {}", user, e))?;
        let dir = backing_path(&self.root, user, &relative_path);

        if !dir.exists() {
            return Ok(Vec::new());
        }
        if !directory_exists(&dir) {
            return Err(StorageError::NotADirectory(relative_path));
        }

        let list = || -> std::io::Result<Vec<DirEntry>> {
            let mut entries = Vec::new();
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                let metadata = entry.metadata()?;
                entries.push(DirEntry {
                    name: entry.file_name().to_string_lossy().to_string(),
                    is_dir: metadata.is_dir(),
                    size: if metadata.is_dir() { 0 } else { metadata.len() },
                    modified: modified_secs(&metadata),
                });
            }
            Ok(entries)
        };

        let mut entries = list().map_err(|e| {
            error!("Failed to list directory {}: {}", dir.display(), e);
            StorageError::from(e)
        })?;
        entries.sort_by(DirEntry::listing_order);
        Ok(entries)
    }

    /// True iff a record exists for `(user, filename)` and its backing file is
    /// present on disk.
    pub fn exists(&self, filename: &str, user: &str) -> bool {
        match self.resolve(user, filename) {
            Ok((relative_path, path)) => {
                self.index.get(user, &relative_path).is_some() && file_exists(&path)
            }
            Err(_) => false,
        }
    }

    /// Copy of the record for `(user, filename)`
    pub fn stat(&self, filename: &str, user: &str) -> Result<FileRecord, StorageError> {
        let (relative_path, _) = self.resolve(user, filename)?;
        self.index
            .get(user, &relative_path)
            .cloned()
            .ok_or(StorageError::NotFound(relative_path))
    }

    /// Records filed under `owner`, sorted by relative path
    pub fn owner_files(&self, owner: &str) -> Vec<(String, FileRecord)> {
        self.index
            .files_of(owner)
            .map(|(path, record)| (path.to_string(), record.clone()))
            .collect()
    }

    /// Whether `owner` has any records or a subtree on disk
    pub fn owner_exists(&self, owner: &str) -> bool {
        self.guard.owner(owner).is_ok()
            && (self.index.contains_owner(owner) || directory_exists(&self.root.join(owner)))
    }

    /// Remove `owner`'s whole subtree and every record filed under it,
    /// read-only records included. Returns the number of records removed.
    pub fn purge_owner(&mut self, owner: &str) -> Result<usize, StorageError> {
        self.guard.owner(owner)?;
        let dir = self.root.join(owner);

        if directory_exists(&dir) {
            fs::remove_dir_all(&dir).map_err(|e| {
                error!("Failed to remove {}: {}", dir.display(), e);
                StorageError::from(e)
            })?;
        }

        let removed = self.index.remove_owner(owner);
        self.persist()?;

        info!("Purged owner {} ({} records)", owner, removed);
        Ok(removed)
    }

    fn resolve(&self, owner: &str, filename: &str) -> Result<(String, PathBuf), StorageError> {
        self.guard.owner(owner)?;
        let relative_path = self.guard.file_path(filename)?;
        let path = backing_path(&self.root, owner, &relative_path);
        Ok((relative_path, path))
    }

    fn persist(&self) -> Result<(), StorageError> {
        self.index.save(&self.meta_path)
    }
}
