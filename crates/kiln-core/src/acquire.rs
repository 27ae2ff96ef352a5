//! Repository acquisition.
//!
//! Produces a working copy for a package under `<work_root>/<name>`: either
//! the one left by an earlier run (if the operator chooses to reuse it) or a
//! fresh shallow clone, optionally patched.

use std::path::{Component, Path, PathBuf};
use std::process::Command;

use kiln_schema::CommitId;
use thiserror::Error;

use crate::context::Context;
use crate::exec::ExecError;
use crate::source::Origin;
use crate::vcs::VcsError;

/// File extension identifying patch files inside a patch directory.
pub const PATCH_EXTENSION: &str = "patch";

/// Errors that stop acquisition of a single package.
#[derive(Error, Debug)]
pub enum AcquireError {
    /// The operator chose to abort when asked about an existing directory.
    #[error("installation aborted by user")]
    Aborted,

    /// The patch directory path contains `..`.
    #[error("invalid patch directory path (parent traversal): {}", .0.display())]
    PatchPathTraversal(PathBuf),

    /// The patch directory does not exist.
    #[error("patches directory does not exist: {}", .0.display())]
    PatchDirMissing(PathBuf),

    /// The clone failed.
    #[error("failed to clone {origin}: {source}")]
    Clone {
        /// What was being cloned.
        origin: Origin,
        /// Underlying failure.
        #[source]
        source: VcsError,
    },

    /// A patch did not apply.
    #[error("failed to apply patch {}: {source}", .patch.display())]
    Patch {
        /// The patch file.
        patch: PathBuf,
        /// Underlying failure.
        #[source]
        source: ExecError,
    },

    /// Patch discovery walked into an unreadable entry.
    #[error("failed to find patches: {0}")]
    PatchDiscovery(#[from] walkdir::Error),

    /// Filesystem failure while preparing the working directory.
    #[error("failed to prepare {}: {source}", .path.display())]
    Io {
        /// Path being prepared.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
}

/// What to do with a non-empty working directory left by an earlier run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingDir {
    /// Build from the existing working copy.
    Reuse,
    /// Delete it and clone again.
    Refetch,
    /// Stop installing this package.
    Abort,
}

impl ExistingDir {
    const CHOICES: [Self; 3] = [Self::Reuse, Self::Refetch, Self::Abort];

    fn label(self) -> &'static str {
        match self {
            Self::Reuse => "Use existing directory",
            Self::Refetch => "Remove directory and re-clone",
            Self::Abort => "Abort installation",
        }
    }
}

/// What to acquire.
#[derive(Debug, Clone, Copy)]
pub struct AcquireRequest<'a> {
    /// Package name (working directory name).
    pub name: &'a str,
    /// Where to clone from.
    pub origin: &'a Origin,
    /// Branch to clone, if not the default.
    pub branch: Option<&'a str>,
    /// Directory of `*.patch` files to apply after cloning.
    pub patches: Option<&'a Path>,
}

/// A working copy ready to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    /// The working directory.
    pub dir: PathBuf,
    /// Commit checked out; empty when it could not be read.
    pub commit: CommitId,
    /// Whether an existing working copy was reused instead of cloned.
    pub reused: bool,
}

/// Acquire the working copy for one package.
///
/// # Errors
///
/// Returns [`AcquireError`] on abort, clone failure, an invalid or missing
/// patch directory, or a patch that does not apply. Failing to read the
/// commit id is not an error: the checkout carries an empty id instead.
pub fn acquire(ctx: &Context, req: &AcquireRequest<'_>) -> Result<Checkout, AcquireError> {
    let patches = req
        .patches
        .map(|dir| validate_patch_dir(ctx, dir))
        .transpose()?;

    let dir = ctx.layout.work_dir(req.name);

    if ctx.probe.is_dir(&dir) && !ctx.probe.is_dir_empty(&dir) {
        match ask_existing(ctx, &dir) {
            ExistingDir::Reuse => {
                ctx.reporter.info("Using existing directory...");
                if patches.is_some() {
                    ctx.reporter
                        .warning("Patches are only applied to fresh clones; skipping.");
                }
                let commit = read_commit(ctx, &dir);
                return Ok(Checkout {
                    dir,
                    commit,
                    reused: true,
                });
            }
            ExistingDir::Refetch => {
                ctx.reporter.info("Removing directory and re-cloning...");
                std::fs::remove_dir_all(&dir).map_err(|source| AcquireError::Io {
                    path: dir.clone(),
                    source,
                })?;
            }
            ExistingDir::Abort => return Err(AcquireError::Aborted),
        }
    }

    if let Some(parent) = dir.parent() {
        std::fs::create_dir_all(parent).map_err(|source| AcquireError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    ctx.vcs
        .clone_shallow(req.origin, req.branch, &dir)
        .map_err(|source| AcquireError::Clone {
            origin: req.origin.clone(),
            source,
        })?;

    let commit = read_commit(ctx, &dir);

    if let Some(patches) = &patches {
        apply_patches(ctx, &dir, patches)?;
    }

    Ok(Checkout {
        dir,
        commit,
        reused: false,
    })
}

fn ask_existing(ctx: &Context, dir: &Path) -> ExistingDir {
    let options: Vec<String> = ExistingDir::CHOICES
        .iter()
        .map(|c| c.label().to_string())
        .collect();
    let prompt = format!("Build directory '{}' already exists.", dir.display());
    ctx.interaction
        .select(&prompt, &options)
        .and_then(|i| ExistingDir::CHOICES.get(i).copied())
        .unwrap_or(ExistingDir::Abort)
}

fn read_commit(ctx: &Context, dir: &Path) -> CommitId {
    match ctx.vcs.head(dir) {
        Ok(commit) => commit,
        Err(e) => {
            ctx.reporter
                .warning(&format!("Could not get git hash: {e}"));
            CommitId::unknown()
        }
    }
}

/// Reject traversal, then anchor the directory to the current directory.
///
/// Patches run with the working copy as their current directory, so every
/// path handed to `patch` must be absolute.
fn validate_patch_dir(ctx: &Context, patches: &Path) -> Result<PathBuf, AcquireError> {
    if patches.components().any(|c| c == Component::ParentDir) {
        return Err(AcquireError::PatchPathTraversal(patches.to_path_buf()));
    }
    let absolute = std::path::absolute(patches).map_err(|source| AcquireError::Io {
        path: patches.to_path_buf(),
        source,
    })?;
    if !ctx.probe.is_dir(&absolute) {
        return Err(AcquireError::PatchDirMissing(patches.to_path_buf()));
    }
    Ok(absolute)
}

/// All `*.patch` files below `dir`, in lexical order of their paths.
///
/// # Errors
///
/// Returns the walk error if an entry below `dir` cannot be read.
pub fn find_patches(dir: &Path) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut patches = Vec::new();
    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let is_patch = entry
            .path()
            .extension()
            .is_some_and(|ext| ext == PATCH_EXTENSION);
        if entry.file_type().is_file() && is_patch {
            patches.push(entry.into_path());
        }
    }
    Ok(patches)
}

fn apply_patches(ctx: &Context, work_dir: &Path, patches_dir: &Path) -> Result<(), AcquireError> {
    let patches = find_patches(patches_dir)?;
    for patch in patches {
        ctx.reporter
            .info(&format!("Applying patch {}", patch.display()));
        let mut cmd = Command::new("patch");
        cmd.arg("-Np1").arg("-i").arg(&patch).current_dir(work_dir);
        ctx.runner
            .run(&mut cmd)
            .map_err(|source| AcquireError::Patch { patch, source })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::HostRunner;
    use crate::testing::TestKit;
    use std::sync::Arc;

    fn request<'a>(origin: &'a Origin, patches: Option<&'a Path>) -> AcquireRequest<'a> {
        AcquireRequest {
            name: "foo",
            origin,
            branch: None,
            patches,
        }
    }

    #[test]
    fn test_fresh_clone_records_commit() {
        let kit = TestKit::new();
        kit.vcs.set_head("abc123");
        let origin = Origin::resolve("org/foo").unwrap();

        let checkout = acquire(&kit.ctx(), &request(&origin, None)).unwrap();

        assert!(!checkout.reused);
        assert_eq!(checkout.commit, "abc123");
        assert_eq!(checkout.dir, kit.layout.work_dir("foo"));
        assert_eq!(kit.vcs.clones(), ["https://github.com/org/foo"]);
    }

    #[test]
    fn test_unreadable_commit_degrades_to_empty() {
        let kit = TestKit::new();
        kit.vcs.fail_head();
        let origin = Origin::resolve("org/foo").unwrap();

        let checkout = acquire(&kit.ctx(), &request(&origin, None)).unwrap();

        assert!(checkout.commit.is_empty());
        assert!(kit.reporter.contains("Could not get git hash"));
    }

    #[test]
    fn test_clone_failure_is_fatal() {
        let kit = TestKit::new();
        kit.vcs.fail_clone();
        let origin = Origin::resolve("org/foo").unwrap();

        let err = acquire(&kit.ctx(), &request(&origin, None)).unwrap_err();
        assert!(matches!(err, AcquireError::Clone { .. }));
    }

    #[test]
    fn test_existing_dir_abort_leaves_everything() {
        let kit = TestKit::new();
        let dir = kit.layout.work_dir("foo");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Makefile"), "all:\n").unwrap();
        kit.interaction.answer_select(Some(2));
        let origin = Origin::resolve("org/foo").unwrap();

        let err = acquire(&kit.ctx(), &request(&origin, None)).unwrap_err();

        assert!(matches!(err, AcquireError::Aborted));
        assert!(kit.vcs.clones().is_empty());
        assert!(dir.join("Makefile").exists());
    }

    #[test]
    fn test_existing_dir_unanswered_aborts() {
        let kit = TestKit::new();
        let dir = kit.layout.work_dir("foo");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("README"), "x").unwrap();
        kit.interaction.answer_select(None);
        let origin = Origin::resolve("org/foo").unwrap();

        let err = acquire(&kit.ctx(), &request(&origin, None)).unwrap_err();
        assert!(matches!(err, AcquireError::Aborted));
    }

    #[test]
    fn test_existing_dir_reuse_skips_clone() {
        let kit = TestKit::new();
        let dir = kit.layout.work_dir("foo");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Makefile"), "all:\n").unwrap();
        kit.vcs.set_head("feed42");
        kit.interaction.answer_select(Some(0));
        let origin = Origin::resolve("org/foo").unwrap();

        let checkout = acquire(&kit.ctx(), &request(&origin, None)).unwrap();

        assert!(checkout.reused);
        assert_eq!(checkout.commit, "feed42");
        assert!(kit.vcs.clones().is_empty());
    }

    #[test]
    fn test_existing_dir_refetch_deletes_and_clones() {
        let kit = TestKit::new();
        let dir = kit.layout.work_dir("foo");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("stale.o"), "x").unwrap();
        kit.interaction.answer_select(Some(1));
        let origin = Origin::resolve("org/foo").unwrap();

        let checkout = acquire(&kit.ctx(), &request(&origin, None)).unwrap();

        assert!(!checkout.reused);
        assert!(!dir.join("stale.o").exists());
        assert_eq!(kit.vcs.clones().len(), 1);
    }

    #[test]
    fn test_patch_dir_with_parent_traversal_rejected() {
        let kit = TestKit::new();
        let origin = Origin::resolve("org/foo").unwrap();
        let patches = Path::new("patches/../../etc");

        let err = acquire(&kit.ctx(), &request(&origin, Some(patches))).unwrap_err();

        assert!(matches!(err, AcquireError::PatchPathTraversal(_)));
        assert!(kit.vcs.clones().is_empty());
    }

    #[test]
    fn test_missing_patch_dir_rejected() {
        let kit = TestKit::new();
        let origin = Origin::resolve("org/foo").unwrap();
        let patches = kit.root().join("no-such-patches");

        let err = acquire(&kit.ctx(), &request(&origin, Some(&patches))).unwrap_err();
        assert!(matches!(err, AcquireError::PatchDirMissing(_)));
    }

    #[test]
    fn test_patches_applied_in_lexical_order() {
        let kit = TestKit::new();
        let patches = kit.root().join("patches");
        std::fs::create_dir_all(patches.join("sub")).unwrap();
        std::fs::write(patches.join("0002-second.patch"), "").unwrap();
        std::fs::write(patches.join("0001-first.patch"), "").unwrap();
        std::fs::write(patches.join("notes.txt"), "").unwrap();
        std::fs::write(patches.join("sub").join("0003-third.patch"), "").unwrap();
        let origin = Origin::resolve("org/foo").unwrap();

        acquire(&kit.ctx(), &request(&origin, Some(&patches))).unwrap();

        let applied: Vec<String> = kit
            .runner
            .calls()
            .into_iter()
            .filter(|c| c.program == "patch")
            .map(|c| c.args[2].clone())
            .collect();
        assert_eq!(
            applied,
            [
                patches.join("0001-first.patch").display().to_string(),
                patches.join("0002-second.patch").display().to_string(),
                patches.join("sub").join("0003-third.patch").display().to_string(),
            ]
        );
    }

    #[test]
    fn test_failed_patch_is_fatal() {
        let kit = TestKit::new();
        let patches = kit.root().join("patches");
        std::fs::create_dir_all(&patches).unwrap();
        std::fs::write(patches.join("broken.patch"), "").unwrap();
        kit.runner.fail("patch");
        let origin = Origin::resolve("org/foo").unwrap();

        let err = acquire(&kit.ctx(), &request(&origin, Some(&patches))).unwrap_err();
        assert!(matches!(err, AcquireError::Patch { .. }));
    }

    #[test]
    fn test_relative_patch_dir_applies_from_work_dir() {
        if which::which("patch").is_err() {
            return;
        }
        let kit = TestKit::new();
        kit.vcs.seed("hello.txt", "old\n");
        let patches = kit.root().join("patches");
        std::fs::create_dir_all(&patches).unwrap();
        std::fs::write(
            patches.join("0001-hello.patch"),
            "--- a/hello.txt\n+++ b/hello.txt\n@@ -1 +1 @@\n-old\n+new\n",
        )
        .unwrap();
        let mut ctx = kit.ctx();
        ctx.runner = Arc::new(HostRunner);
        let origin = Origin::resolve("org/foo").unwrap();
        std::env::set_current_dir(kit.root()).unwrap();

        let checkout = acquire(&ctx, &request(&origin, Some(Path::new("patches")))).unwrap();

        let patched = std::fs::read_to_string(checkout.dir.join("hello.txt")).unwrap();
        assert_eq!(patched, "new\n");
    }
}
