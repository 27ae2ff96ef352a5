//! kiln - build and install tools straight from their source repositories
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! # Overview
//!
//! `kiln install org/repo` clones the repository, detects its build system
//! (make, cargo, cmake, configure, zig or a `build.sh`), builds it after the
//! operator has reviewed the build file, and copies the resulting binary to
//! `/usr/local/bin` or `~/.local/bin`. Installed packages are tracked so they
//! can be listed, removed, and upgraded when their upstream moves.
//!
//! # Directory Layout
//!
//! ```text
//! /var/lib/kiln/packages.json   # registry of installed packages
//! /tmp/kiln/builds/<name>/      # working copy per package
//! /usr/local/bin/<name>         # system installs
//! ~/.local/bin/<name>           # --local installs
//! ```

pub mod cmd;
pub mod ui;

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use kiln_core::Layout;
use kiln_core::paths::try_default_local_bin;

#[derive(Debug, Parser)]
#[command(name = "kiln")]
#[command(author, version, about = "kiln - build and install tools from source")]
pub struct Cli {
    #[command(flatten)]
    pub paths: PathArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides for the on-disk layout.
#[derive(Debug, Clone, Default, Args)]
pub struct PathArgs {
    /// Directory holding the package registry
    #[arg(long, global = true, env = "KILN_STATE_DIR", value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Root of the per-package build directories
    #[arg(long, global = true, env = "KILN_WORK_DIR", value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// System-wide binary directory
    #[arg(long, global = true, env = "KILN_BIN_DIR", value_name = "DIR")]
    pub bin_dir: Option<PathBuf>,

    /// Per-user binary directory used by --local
    #[arg(long, global = true, env = "KILN_LOCAL_BIN_DIR", value_name = "DIR")]
    pub local_bin_dir: Option<PathBuf>,
}

impl PathArgs {
    /// The standard layout with any overrides applied.
    pub fn layout(&self) -> Result<Layout> {
        let local_bin = match &self.local_bin_dir {
            Some(dir) => dir.clone(),
            None => try_default_local_bin()
                .context("Cannot determine home directory; pass --local-bin-dir")?,
        };
        let mut layout = Layout::standard(local_bin);
        if let Some(dir) = &self.state_dir {
            layout.state_dir.clone_from(dir);
        }
        if let Some(dir) = &self.work_dir {
            layout.work_root.clone_from(dir);
        }
        if let Some(dir) = &self.bin_dir {
            layout.system_bin.clone_from(dir);
        }
        Ok(layout)
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build and install packages from source
    Install {
        /// Package references: org/repo, host/org/repo or a full URL
        packages: Vec<String>,
        /// Install to the per-user bin directory instead of the system one
        #[arg(long)]
        local: bool,
        /// Clone this branch instead of the default
        #[arg(long)]
        branch: Option<String>,
        /// Apply every *.patch file in this directory after cloning
        #[arg(long, value_name = "DIR")]
        patches: Option<PathBuf>,
        /// Skip the system install confirmation
        #[arg(short, long)]
        yes: bool,
        /// Read more package references from FILE, one per line
        #[arg(long, value_name = "FILE")]
        pkgdeps: Option<PathBuf>,
        /// Link statically
        #[arg(long = "static")]
        static_link: bool,
    },
    /// Remove installed packages
    Remove {
        /// Package name(s)
        #[arg(required = true)]
        packages: Vec<String>,
    },
    /// List installed packages
    List,
    /// Reinstall packages whose upstream has new commits
    Upgrade {
        /// Specific packages to upgrade (or all if empty)
        packages: Vec<String>,
        /// Only packages installed with --local
        #[arg(long)]
        local: bool,
        /// Skip confirmation prompts
        #[arg(short, long)]
        yes: bool,
    },
}
