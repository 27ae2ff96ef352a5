//! Version control access.

use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use kiln_schema::CommitId;
use thiserror::Error;

use crate::exec::{CommandRunner, ExecError};
use crate::source::Origin;

/// Errors from version control operations.
#[derive(Error, Debug)]
pub enum VcsError {
    /// The git invocation failed.
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// The remote listing succeeded but named no commit.
    #[error("no commit found for {0}")]
    NoRemoteHead(String),
}

/// Fetching and inspecting repositories.
pub trait Vcs: Send + Sync {
    /// Shallow-clone `origin` into `dest`, optionally at `branch`.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError`] if the clone fails.
    fn clone_shallow(
        &self,
        origin: &Origin,
        branch: Option<&str>,
        dest: &Path,
    ) -> Result<(), VcsError>;

    /// Commit checked out in `work_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError`] if the commit cannot be read.
    fn head(&self, work_dir: &Path) -> Result<CommitId, VcsError>;

    /// Current head commit of `origin` (or of `branch`), without fetching objects.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError`] if the remote is unreachable or lists no commit.
    fn remote_head(&self, origin: &Origin, branch: Option<&str>) -> Result<CommitId, VcsError>;
}

/// [`Vcs`] backed by the `git` command line.
#[derive(Clone)]
pub struct Git {
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git").finish_non_exhaustive()
    }
}

impl Git {
    /// Create a git client running commands through `runner`.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl Vcs for Git {
    fn clone_shallow(
        &self,
        origin: &Origin,
        branch: Option<&str>,
        dest: &Path,
    ) -> Result<(), VcsError> {
        let mut cmd = Command::new("git");
        cmd.args(["clone", "--depth=1"]);
        if let Some(branch) = branch {
            cmd.args(["--branch", branch]);
        }
        cmd.arg(origin.url()).arg(dest);
        self.runner.run(&mut cmd)?;
        Ok(())
    }

    fn head(&self, work_dir: &Path) -> Result<CommitId, VcsError> {
        let out = self.runner.capture(
            Command::new("git")
                .args(["rev-parse", "HEAD"])
                .current_dir(work_dir),
        )?;
        Ok(CommitId::new(out))
    }

    fn remote_head(&self, origin: &Origin, branch: Option<&str>) -> Result<CommitId, VcsError> {
        let url = origin.url();
        let reference = branch.map_or_else(|| "HEAD".to_string(), |b| format!("refs/heads/{b}"));
        let out = self
            .runner
            .capture(Command::new("git").args(["ls-remote", &url, &reference]))?;
        parse_ls_remote(&out).ok_or(VcsError::NoRemoteHead(url))
    }
}

/// First commit id in `git ls-remote` output (`<sha>\t<ref>` per line).
fn parse_ls_remote(output: &str) -> Option<CommitId> {
    output
        .lines()
        .find_map(|line| line.split_whitespace().next())
        .map(CommitId::new)
}
