//! Compiler and linker flags from package metadata.
//!
//! Before a build, the package name is looked up with `pkg-config`. A missing
//! tool or an unknown package yields empty flags: the lookup can only ever
//! improve a build, never fail it.

use std::process::Command;
use std::sync::Arc;

use crate::exec::CommandRunner;

/// Flags handed to build procedures through `CFLAGS` / `LDFLAGS`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileFlags {
    /// Preprocessor and include flags (`-I`, `-D`).
    pub cflags: String,
    /// Library search and link flags (`-L`, `-l`).
    pub libs: String,
}

impl CompileFlags {
    /// Split a `pkg-config --cflags --libs` line into compile and link flags.
    ///
    /// ```
    /// use kiln_core::CompileFlags;
    ///
    /// let flags = CompileFlags::parse("-I/usr/include/x -DX=1 -L/usr/lib -lx -pthread");
    /// assert_eq!(flags.cflags, "-I/usr/include/x -DX=1");
    /// assert_eq!(flags.libs, "-L/usr/lib -lx");
    /// ```
    pub fn parse(line: &str) -> Self {
        let mut cflags = Vec::new();
        let mut libs = Vec::new();
        for part in line.split_whitespace() {
            if part.starts_with("-I") || part.starts_with("-D") {
                cflags.push(part);
            } else if part.starts_with("-L") || part.starts_with("-l") {
                libs.push(part);
            }
        }
        Self {
            cflags: cflags.join(" "),
            libs: libs.join(" "),
        }
    }

    /// True when neither compile nor link flags are set.
    pub fn is_empty(&self) -> bool {
        self.cflags.is_empty() && self.libs.is_empty()
    }
}

/// Package-metadata query facility.
pub trait FlagSource: Send + Sync {
    /// Whether the facility is installed at all.
    fn available(&self) -> bool;

    /// Flags for `package`, empty on any failure.
    fn query(&self, package: &str, static_link: bool) -> CompileFlags;
}

/// [`FlagSource`] backed by the `pkg-config` command.
#[derive(Clone)]
pub struct PkgConfig {
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for PkgConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkgConfig").finish_non_exhaustive()
    }
}

impl PkgConfig {
    /// Create a pkg-config client running commands through `runner`.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn run(&self, package: &str, static_link: bool) -> Option<CompileFlags> {
        let mut cmd = Command::new("pkg-config");
        if static_link {
            cmd.arg("--static");
        }
        cmd.args(["--cflags", "--libs", package]);
        match self.runner.capture(&mut cmd) {
            Ok(out) => Some(CompileFlags::parse(out.trim())),
            Err(e) => {
                tracing::debug!(package, static_link, "pkg-config lookup failed: {e}");
                None
            }
        }
    }
}

impl FlagSource for PkgConfig {
    fn available(&self) -> bool {
        which::which("pkg-config").is_ok()
    }

    fn query(&self, package: &str, static_link: bool) -> CompileFlags {
        let flags = if static_link {
            // Packages without static metadata still have usable dynamic flags.
            self.run(package, true)
                .or_else(|| self.run(package, false))
        } else {
            self.run(package, false)
        };
        flags.unwrap_or_default()
    }
}
