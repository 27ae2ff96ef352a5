//! Filesystem predicates.
//!
//! Build-descriptor detection and binary lookup only ever ask yes/no questions
//! about paths, so they take a [`Probe`] instead of touching the disk.

use std::path::Path;

/// Abstraction over filesystem predicates for testability.
pub trait Probe: Send + Sync {
    /// Check if path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Check if path is a regular file (symlinks are followed).
    fn is_file(&self, path: &Path) -> bool;

    /// Check if a directory has no entries. Unreadable directories count as empty.
    fn is_dir_empty(&self, path: &Path) -> bool;
}

/// [`Probe`] backed by the host filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFs;

impl Probe for HostFs {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir_empty(&self, path: &Path) -> bool {
        std::fs::read_dir(path).map_or(true, |mut entries| entries.next().is_none())
    }
}
