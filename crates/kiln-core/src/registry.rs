//! Installed-package registry.
//!
//! A single JSON array of [`PackageRecord`]s at `<state_dir>/packages.json`.
//! Every mutation rewrites the whole file through a temporary file and a
//! rename, so a reader never sees a half-written registry. There is no
//! locking: one kiln process at a time is assumed.

use std::path::{Path, PathBuf};

use chrono::Utc;
use kiln_schema::PackageRecord;
use thiserror::Error;

/// Suffix of the copies kept when an unreadable registry is about to be
/// replaced. Each copy also carries a UTC timestamp.
pub const CORRUPT_SUFFIX: &str = "corrupt";

/// Errors reading or writing the registry file.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The file exists but could not be read or written.
    #[error("registry I/O error at {}: {source}", .path.display())]
    Io {
        /// Registry file or its temporary sibling.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid record list.
    #[error("registry at {} is corrupt: {source}", .path.display())]
    Corrupt {
        /// Registry file.
        path: PathBuf,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// Records could not be serialized.
    #[error("failed to serialize registry: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Handle to the registry file.
#[derive(Debug, Clone)]
pub struct Registry {
    path: PathBuf,
}

impl Registry {
    /// Registry stored at `path`. Nothing is read until asked.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record, distinguishing a corrupt file from a missing one.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] if the file exists but cannot be read and
    /// [`RegistryError::Corrupt`] if it cannot be parsed.
    pub fn try_load(&self) -> Result<Vec<PackageRecord>, RegistryError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(RegistryError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|source| RegistryError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Read every record. An unreadable or corrupt file reads as empty.
    pub fn load(&self) -> Vec<PackageRecord> {
        self.try_load().unwrap_or_else(|e| {
            tracing::warn!("{e}; treating registry as empty");
            Vec::new()
        })
    }

    /// Look up one record by name.
    pub fn get(&self, name: &str) -> Option<PackageRecord> {
        self.load().into_iter().find(|r| r.name == *name)
    }

    /// Replace the file with `records`.
    ///
    /// A corrupt file is first copied to `packages.json.corrupt-<timestamp>` so
    /// its contents survive the rewrite. Earlier backups are never overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the state directory cannot be created or
    /// the file cannot be written.
    pub fn save(&self, records: &[PackageRecord]) -> Result<(), RegistryError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| RegistryError::Io { path, source }
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        if let Err(RegistryError::Corrupt { .. }) = self.try_load() {
            let backup = self.corrupt_backup_path();
            tracing::warn!(backup = %backup.display(), "preserving corrupt registry");
            std::fs::copy(&self.path, &backup).map_err(io_err(&backup))?;
        }

        let content = serde_json::to_string_pretty(records).map_err(RegistryError::Serialize)?;
        let temp = self.sibling("tmp");
        std::fs::write(&temp, content).map_err(io_err(&temp))?;
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp, std::fs::Permissions::from_mode(0o644))
                .map_err(io_err(&temp))?;
        }
        std::fs::rename(&temp, &self.path).map_err(io_err(&self.path))
    }

    /// Insert `record`, or replace the record with the same name in place.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the registry cannot be written.
    pub fn upsert(&self, record: PackageRecord) -> Result<(), RegistryError> {
        let mut records = self.load();
        match records.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        self.save(&records)
    }

    /// Delete the record named `name`, returning it.
    ///
    /// Returns None and leaves the file untouched when there is no such record.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the registry cannot be written.
    pub fn remove(&self, name: &str) -> Result<Option<PackageRecord>, RegistryError> {
        let mut records = self.load();
        let Some(index) = records.iter().position(|r| r.name == *name) else {
            return Ok(None);
        };
        let removed = records.remove(index);
        self.save(&records)?;
        Ok(Some(removed))
    }

    fn corrupt_backup_path(&self) -> PathBuf {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
        let base = format!("{CORRUPT_SUFFIX}-{stamp}");
        let mut candidate = self.sibling(&base);
        let mut n = 1;
        while candidate.exists() {
            candidate = self.sibling(&format!("{base}-{n}"));
            n += 1;
        }
        candidate
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(suffix);
        self.path.with_file_name(name)
    }
}
