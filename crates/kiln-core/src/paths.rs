//! On-disk layout.
//!
//! All paths kiln touches hang off a [`Layout`] value that is passed down
//! explicitly, so a sandboxed layout (see [`Layout::rooted`]) is all a test
//! needs to keep the host untouched.

use dirs::home_dir;
use std::path::{Path, PathBuf};

use kiln_schema::{InstallScope, REGISTRY_FILE};

/// Default directory holding the package registry.
pub const DEFAULT_STATE_DIR: &str = "/var/lib/kiln";

/// Default root of the per-package working directories.
pub const DEFAULT_WORK_ROOT: &str = "/tmp/kiln/builds";

/// Default shared executable directory.
pub const DEFAULT_SYSTEM_BIN: &str = "/usr/local/bin";

/// Returns `~/.local/bin`, or None if the user's home cannot be resolved.
pub fn try_default_local_bin() -> Option<PathBuf> {
    home_dir().map(|h| h.join(".local").join("bin"))
}

/// Where kiln keeps its state, its working copies and the binaries it installs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Directory holding the registry file.
    pub state_dir: PathBuf,
    /// One subdirectory per package name.
    pub work_root: PathBuf,
    /// Per-user executable directory, created on demand.
    pub local_bin: PathBuf,
    /// Shared system executable directory.
    pub system_bin: PathBuf,
}

impl Layout {
    /// The standard system layout with the given per-user bin directory.
    pub fn standard(local_bin: PathBuf) -> Self {
        Self {
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            work_root: PathBuf::from(DEFAULT_WORK_ROOT),
            local_bin,
            system_bin: PathBuf::from(DEFAULT_SYSTEM_BIN),
        }
    }

    /// A layout with every directory below `root`.
    ///
    /// ```
    /// use kiln_core::Layout;
    /// use std::path::Path;
    ///
    /// let layout = Layout::rooted(Path::new("/sandbox"));
    /// assert_eq!(layout.registry_path(), Path::new("/sandbox/state/packages.json"));
    /// assert_eq!(layout.work_dir("fd"), Path::new("/sandbox/builds/fd"));
    /// ```
    pub fn rooted(root: &Path) -> Self {
        Self {
            state_dir: root.join("state"),
            work_root: root.join("builds"),
            local_bin: root.join("home").join(".local").join("bin"),
            system_bin: root.join("usr").join("local").join("bin"),
        }
    }

    /// Registry file: `<state_dir>/packages.json`
    pub fn registry_path(&self) -> PathBuf {
        self.state_dir.join(REGISTRY_FILE)
    }

    /// Working directory for a package: `<work_root>/<name>`
    pub fn work_dir(&self, name: &str) -> PathBuf {
        self.work_root.join(name)
    }

    /// Destination directory for the given scope.
    pub fn bin_dir(&self, scope: InstallScope) -> &Path {
        match scope {
            InstallScope::Local => &self.local_bin,
            InstallScope::System => &self.system_bin,
        }
    }

    /// Create the state and work directories.
    ///
    /// # Errors
    ///
    /// Returns the first directory creation failure.
    pub fn ensure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_root)?;
        std::fs::create_dir_all(&self.state_dir)
    }
}
