//! Binary installation and removal.
//!
//! Local-scope binaries are copied directly into the per-user bin directory.
//! System-scope binaries are copied directly when running as root and through
//! a privilege helper (`doas` or `sudo`) otherwise.

use std::path::{Path, PathBuf};
use std::process::Command;

use kiln_schema::InstallScope;
use thiserror::Error;

use crate::context::Context;
use crate::exec::ExecError;

/// Privilege helpers, in order of preference.
pub const PRIVILEGE_HELPERS: [&str; 2] = ["doas", "sudo"];

/// Mode given to every installed binary.
const BINARY_MODE: u32 = 0o755;

/// How the process can write to system locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Privilege {
    /// Already running as root.
    Root,
    /// Not root; privileged commands go through this helper program.
    Helper(String),
    /// Not root and no helper installed.
    Unavailable,
}

impl Privilege {
    /// Inspect the running process and `PATH`.
    pub fn detect() -> Self {
        if is_root() {
            return Self::Root;
        }
        PRIVILEGE_HELPERS
            .iter()
            .find(|helper| which::which(helper).is_ok())
            .map_or(Self::Unavailable, |helper| Self::Helper((*helper).to_string()))
    }
}

#[allow(unsafe_code)]
fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

/// Errors from copying binaries into place or taking them out.
#[derive(Error, Debug)]
pub enum InstallerError {
    /// The operator declined the system-wide install prompt.
    #[error("installation to {} declined", .0.display())]
    Declined(PathBuf),

    /// System scope needs privilege and none can be obtained.
    #[error("no privilege helper found (install doas or sudo, or run as root) to write {}", .0.display())]
    NoPrivilegeHelper(PathBuf),

    /// Direct filesystem operation failed.
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        /// Path being written or removed.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// The privilege helper command failed.
    #[error("privileged command failed: {0}")]
    Helper(#[from] ExecError),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> InstallerError + '_ {
    move |source| InstallerError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Copy `binary` into the bin directory for `scope` as `name`.
///
/// System-scope installs ask for confirmation unless `yes` is set.
///
/// # Errors
///
/// Returns [`InstallerError::Declined`] if the operator says no,
/// [`InstallerError::NoPrivilegeHelper`] if privilege is needed but cannot be
/// obtained, and copy or helper failures otherwise.
pub fn install_binary(
    ctx: &Context,
    binary: &Path,
    name: &str,
    scope: InstallScope,
    yes: bool,
) -> Result<PathBuf, InstallerError> {
    let dest_dir = ctx.layout.bin_dir(scope);
    let dest = dest_dir.join(name);

    match scope {
        InstallScope::Local => {
            std::fs::create_dir_all(dest_dir).map_err(io_err(dest_dir))?;
            copy_executable(binary, &dest)?;
        }
        InstallScope::System => {
            if !yes && !ctx.interaction.confirm(&format!("Install {name} to {}?", dest.display())) {
                return Err(InstallerError::Declined(dest));
            }
            match &ctx.privilege {
                Privilege::Root => {
                    std::fs::create_dir_all(dest_dir).map_err(io_err(dest_dir))?;
                    copy_executable(binary, &dest)?;
                }
                Privilege::Helper(helper) => {
                    let mut cmd = Command::new(helper);
                    cmd.arg("install")
                        .arg("-D")
                        .arg("-m")
                        .arg(format!("{BINARY_MODE:o}"))
                        .arg(binary)
                        .arg(&dest);
                    ctx.runner.run(&mut cmd)?;
                }
                Privilege::Unavailable => return Err(InstallerError::NoPrivilegeHelper(dest)),
            }
        }
    }

    tracing::info!(binary = %binary.display(), dest = %dest.display(), "installed binary");
    Ok(dest)
}

/// Delete `name` from the bin directory for `scope`.
///
/// Returns the removed path, or None when nothing was installed there.
///
/// # Errors
///
/// Returns [`InstallerError`] if the file exists but cannot be removed.
pub fn uninstall_binary(
    ctx: &Context,
    name: &str,
    scope: InstallScope,
) -> Result<Option<PathBuf>, InstallerError> {
    let path = ctx.layout.bin_dir(scope).join(name);
    if !ctx.probe.is_file(&path) {
        return Ok(None);
    }

    match (scope, &ctx.privilege) {
        (InstallScope::Local, _) | (InstallScope::System, Privilege::Root) => {
            std::fs::remove_file(&path).map_err(io_err(&path))?;
        }
        (InstallScope::System, Privilege::Helper(helper)) => {
            ctx.runner
                .run(Command::new(helper).arg("rm").arg("-f").arg(&path))?;
        }
        (InstallScope::System, Privilege::Unavailable) => {
            return Err(InstallerError::NoPrivilegeHelper(path));
        }
    }
    Ok(Some(path))
}

/// Copy next to the destination, mark executable, then rename into place so a
/// running copy of the old binary is never overwritten mid-write.
fn copy_executable(src: &Path, dest: &Path) -> Result<(), InstallerError> {
    use std::os::unix::fs::PermissionsExt;

    let staging = dest.with_extension("kiln-new");
    std::fs::copy(src, &staging).map_err(io_err(&staging))?;
    std::fs::set_permissions(&staging, std::fs::Permissions::from_mode(BINARY_MODE))
        .map_err(io_err(&staging))?;
    std::fs::rename(&staging, dest).map_err(io_err(dest))
}
