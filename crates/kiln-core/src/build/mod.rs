//! Build detection and dispatch.
//!
//! [`detect`] looks for a known build descriptor starting at the working copy
//! and moving toward the filesystem root, stopping at the first level that
//! has any. [`build`] picks one candidate, lets the operator inspect it,
//! and runs the matching [`procedure::BuildProcedure`].

pub mod procedure;

use std::path::{Path, PathBuf};

use kiln_schema::BuildSystem;
use thiserror::Error;

use crate::context::Context;
use crate::exec::ExecError;
use crate::probe::Probe;
use procedure::{Step, procedure_for};

/// Descriptor file names and the build system each one selects, in the order
/// candidates are offered.
pub const DESCRIPTORS: [(&str, BuildSystem); 7] = [
    ("Makefile", BuildSystem::Make),
    ("makefile", BuildSystem::Make),
    ("Cargo.toml", BuildSystem::Cargo),
    ("CMakeLists.txt", BuildSystem::Cmake),
    ("configure", BuildSystem::Configure),
    ("build.zig", BuildSystem::Zig),
    ("build.sh", BuildSystem::Shell),
];

/// Errors that fail a build.
#[derive(Error, Debug)]
pub enum BuildError {
    /// No descriptor at any level from the working copy up.
    #[error("no supported build system found in {} or its parents", .0.display())]
    NoBuildSystem(PathBuf),

    /// The operator declined after reviewing the descriptor.
    #[error("build cancelled by user")]
    Cancelled,

    /// Static linking was requested from a procedure that cannot do it.
    #[error("static linking is not supported by the {0} build procedure")]
    StaticUnsupported(BuildSystem),

    /// A build command failed.
    #[error("{system} build failed: {source}")]
    Step {
        /// Procedure that was running.
        system: BuildSystem,
        /// Underlying failure.
        #[source]
        source: ExecError,
    },

    /// A filesystem step failed.
    #[error("failed to prepare {}: {source}", .path.display())]
    Io {
        /// Path being prepared.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
}

/// A descriptor file found during detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// Full path to the file.
    pub path: PathBuf,
    /// Build system the file selects.
    pub system: BuildSystem,
}

/// Result of a successful [`detect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Directory the descriptors were found in; builds run here.
    pub root: PathBuf,
    /// Every descriptor at that level, in [`DESCRIPTORS`] order. Never empty.
    pub candidates: Vec<Descriptor>,
}

/// Find build descriptors at `start` or the nearest ancestor that has any.
///
/// Returns None if no level up to the filesystem root has a descriptor.
pub fn detect(start: &Path, probe: &dyn Probe) -> Option<Detection> {
    for dir in start.ancestors() {
        let candidates: Vec<Descriptor> = DESCRIPTORS
            .iter()
            .map(|(file, system)| Descriptor {
                path: dir.join(file),
                system: *system,
            })
            .filter(|d| probe.is_file(&d.path))
            .collect();
        if !candidates.is_empty() {
            tracing::debug!(root = %dir.display(), count = candidates.len(), "build descriptors found");
            return Some(Detection {
                root: dir.to_path_buf(),
                candidates,
            });
        }
    }
    None
}

/// Let the operator choose between several candidates.
///
/// An unanswered or out-of-range choice picks the first candidate.
pub fn select<'a>(ctx: &Context, detection: &'a Detection, work_dir: &Path) -> &'a Descriptor {
    let first = &detection.candidates[0];
    if detection.candidates.len() == 1 {
        return first;
    }
    let options: Vec<String> = detection
        .candidates
        .iter()
        .map(|d| {
            d.path
                .strip_prefix(work_dir)
                .unwrap_or(&d.path)
                .display()
                .to_string()
        })
        .collect();
    ctx.interaction
        .select("Multiple build files found:", &options)
        .and_then(|i| detection.candidates.get(i))
        .unwrap_or(first)
}

/// Detect, confirm and run the build for `name` in `work_dir`.
///
/// # Errors
///
/// Returns [`BuildError`] if no descriptor is found, static linking is
/// unsupported by the chosen procedure, the operator declines, or a build
/// step fails.
pub fn build(
    ctx: &Context,
    work_dir: &Path,
    name: &str,
    static_link: bool,
) -> Result<BuildSystem, BuildError> {
    if !ctx.flags.available() {
        ctx.reporter.warning("pkg-config not found in PATH");
    }
    let flags = ctx.flags.query(name, static_link);
    tracing::debug!(name, ?flags, "resolved compile flags");

    let detection = detect(work_dir, ctx.probe.as_ref())
        .ok_or_else(|| BuildError::NoBuildSystem(work_dir.to_path_buf()))?;
    let descriptor = select(ctx, &detection, work_dir);
    let procedure = procedure_for(descriptor.system);

    if static_link && !procedure.supports_static() {
        return Err(BuildError::StaticUnsupported(descriptor.system));
    }

    ctx.reporter
        .info(&format!("Using build file: {}", descriptor.path.display()));
    ctx.interaction.review(&descriptor.path);
    if !ctx.interaction.confirm("Proceed with build?") {
        return Err(BuildError::Cancelled);
    }

    for step in procedure.plan(&detection.root, &flags, static_link) {
        run_step(ctx, descriptor.system, step)?;
    }
    Ok(descriptor.system)
}

fn run_step(ctx: &Context, system: BuildSystem, step: Step) -> Result<(), BuildError> {
    match step {
        Step::CreateDir(path) => {
            std::fs::create_dir_all(&path).map_err(|source| BuildError::Io { path, source })
        }
        Step::MakeExecutable(path) => {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .map_err(|source| BuildError::Io { path, source })
        }
        Step::Run(inv) if inv.best_effort => {
            if let Err(e) = ctx.runner.capture(&mut inv.command()) {
                tracing::warn!(program = %inv.program, "ignoring failure: {e}");
            }
            Ok(())
        }
        Step::Run(inv) => ctx
            .runner
            .run(&mut inv.command())
            .map_err(|source| BuildError::Step { system, source }),
    }
}
