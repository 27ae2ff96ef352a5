//! Package removal.

use std::path::PathBuf;

use kiln_schema::{InstallScope, PackageRecord};

use crate::context::Context;
use crate::installer::uninstall_binary;
use crate::registry::{Registry, RegistryError};

/// What a removal did.
#[derive(Debug, Default)]
pub struct Removal {
    /// The deleted registry record.
    pub record: Option<PackageRecord>,
    /// Binaries deleted.
    pub binaries: Vec<PathBuf>,
    /// Whether the working directory was deleted.
    pub work_dir_removed: bool,
}

impl Removal {
    /// True when the package was not in the registry.
    pub fn not_found(&self) -> bool {
        self.record.is_none()
    }
}

/// Forget `name`, then delete its binaries and working directory.
///
/// A name with no record is reported and nothing else is touched. Binary and
/// working-directory deletion failures are warnings.
///
/// # Errors
///
/// Returns [`RegistryError`] if the registry cannot be rewritten.
pub fn remove(ctx: &Context, registry: &Registry, name: &str) -> Result<Removal, RegistryError> {
    let mut removal = Removal::default();
    let Some(record) = registry.remove(name)? else {
        ctx.reporter
            .error(&format!("Package '{name}' not found"));
        return Ok(removal);
    };

    // The binary may have been installed to either scope over its lifetime.
    for scope in [InstallScope::Local, InstallScope::System] {
        match uninstall_binary(ctx, name, scope) {
            Ok(Some(path)) => {
                ctx.reporter
                    .info(&format!("Removed {scope} binary: {}", path.display()));
                removal.binaries.push(path);
            }
            Ok(None) => {}
            Err(e) => ctx
                .reporter
                .warning(&format!("Failed to remove {scope} binary: {e}")),
        }
    }

    let work_dir = ctx.layout.work_dir(name);
    if ctx.probe.is_dir(&work_dir) {
        match std::fs::remove_dir_all(&work_dir) {
            Ok(()) => removal.work_dir_removed = true,
            Err(e) => ctx.reporter.warning(&format!(
                "Failed to remove build directory {}: {e}",
                work_dir.display()
            )),
        }
    }

    ctx.reporter.success(&format!("Removed {name}"));
    removal.record = Some(record);
    Ok(removal)
}
