//! Finding the executable a build produced.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::build::procedure::musl_target;
use crate::probe::Probe;

/// No candidate location held a file.
#[derive(Error, Debug)]
#[error("binary not found for {name} (searched {} locations)", .searched.len())]
pub struct LocateError {
    /// Package name looked for.
    pub name: String,
    /// Every path probed, in order.
    pub searched: Vec<PathBuf>,
}

/// Conventional output locations for `name`, most specific first.
pub fn candidates(work_dir: &Path, name: &str, static_link: bool) -> Vec<PathBuf> {
    let mut paths = vec![work_dir.join(name)];
    if static_link {
        paths.push(
            work_dir
                .join("target")
                .join(musl_target())
                .join("release")
                .join(name),
        );
    }
    paths.push(work_dir.join("target").join("release").join(name));
    paths.push(work_dir.join("build").join(name));
    paths.push(work_dir.join("zig-out").join("bin").join(name));
    paths
}

/// First candidate that is a regular file.
///
/// # Errors
///
/// Returns [`LocateError`] listing every probed path when none exists.
pub fn locate(
    probe: &dyn Probe,
    work_dir: &Path,
    name: &str,
    static_link: bool,
) -> Result<PathBuf, LocateError> {
    let searched = candidates(work_dir, name, static_link);
    match searched.iter().find(|p| probe.is_file(p)) {
        Some(found) => Ok(found.clone()),
        None => Err(LocateError {
            name: name.to_string(),
            searched,
        }),
    }
}
