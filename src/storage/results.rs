//! Storage result types
//!
//! Defines result structures returned by storage operations.

use std::cmp::Ordering;

/// One immediate child of a browsed directory
#[derive(Debug, Clone, PartialEq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    /// File length in bytes, 0 for directories
    pub size: u64,
    /// Last modification time in UNIX seconds
    pub modified: f64,
}

impl DirEntry {
    /// Directories first, then by name
    pub(crate) fn listing_order(a: &DirEntry, b: &DirEntry) -> Ordering {
        b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name))
    }
}
