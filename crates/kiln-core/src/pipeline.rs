//! The install pipeline.
//!
//! ```text
//! reference --> Origin --> Checkout --> BuildSystem --> binary --> destination --> record
//! ```
//!
//! [`InstallPipeline::install`] runs one package end to end and returns a
//! definitive outcome. [`install_batch`] drives several packages in order,
//! reporting each outcome and carrying on after failures.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;
use kiln_schema::{InstallScope, PackageName, PackageRecord};
use thiserror::Error;

use crate::acquire::{AcquireError, AcquireRequest, acquire};
use crate::build::{self, BuildError};
use crate::context::Context;
use crate::installer::{InstallerError, install_binary};
use crate::locate::{LocateError, locate};
use crate::registry::Registry;
use crate::reporter::Reporter;
use crate::source::{Origin, SourceError};

/// Why a single package was not installed.
#[derive(Error, Debug)]
pub enum InstallError {
    /// The reference looks like a stray option.
    #[error("invalid package name: {0}")]
    InvalidReference(String),

    /// The reference names no repository.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Fetching the working copy failed or was aborted.
    #[error(transparent)]
    Acquire(#[from] AcquireError),

    /// The build failed or was cancelled.
    #[error("build failed: {0}")]
    Build(#[from] BuildError),

    /// The build produced no binary where expected.
    #[error("installation failed: {0}")]
    Locate(#[from] LocateError),

    /// Copying the binary into place failed or was declined.
    #[error("installation failed: {0}")]
    Install(#[from] InstallerError),
}

impl InstallError {
    /// True for operator decisions (abort, decline) as opposed to failures.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            Self::Acquire(AcquireError::Aborted)
                | Self::Build(BuildError::Cancelled)
                | Self::Install(InstallerError::Declined(_))
        )
    }
}

/// Everything needed to install one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    /// Reference as the operator typed it; stored verbatim in the record.
    pub reference: String,
    /// Branch to clone instead of the default.
    pub branch: Option<String>,
    /// Directory of `*.patch` files applied after a fresh clone.
    pub patches: Option<PathBuf>,
    /// Where the binary goes.
    pub scope: InstallScope,
    /// Link statically.
    pub static_link: bool,
    /// Skip the system-install confirmation.
    pub yes: bool,
}

impl InstallRequest {
    /// A request with default options for `reference`.
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            branch: None,
            patches: None,
            scope: InstallScope::default(),
            static_link: false,
            yes: false,
        }
    }

    /// Reinstall an existing record with its recorded options.
    pub fn from_record(record: &PackageRecord, yes: bool) -> Self {
        Self {
            reference: record.repo.clone(),
            branch: record.branch.clone(),
            patches: None,
            scope: record.scope(),
            static_link: record.static_link,
            yes,
        }
    }
}

/// A completed install.
#[derive(Debug, Clone)]
pub struct Installed {
    /// The record written (or meant to be written) to the registry.
    pub record: PackageRecord,
    /// Where the binary was installed.
    pub destination: PathBuf,
    /// Wall time from start of acquisition to registry update.
    pub elapsed: Duration,
}

/// Something that can install one package.
pub trait Pipeline {
    /// Install one package end to end.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError`] if any stage fails or is cancelled. The
    /// registry is never touched for a failed install.
    fn install(&self, request: &InstallRequest) -> Result<Installed, InstallError>;
}

/// The real pipeline: acquire, build, locate, install, record.
#[derive(Debug, Clone)]
pub struct InstallPipeline {
    ctx: Context,
    registry: Registry,
}

impl InstallPipeline {
    /// A pipeline recording into the registry named by the context layout.
    pub fn new(ctx: Context) -> Self {
        let registry = Registry::open(ctx.layout.registry_path());
        Self { ctx, registry }
    }

    /// The registry installs are recorded in.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Pipeline for InstallPipeline {
    fn install(&self, request: &InstallRequest) -> Result<Installed, InstallError> {
        let ctx = &self.ctx;
        let start = Instant::now();

        if request.reference.starts_with("--") {
            return Err(InstallError::InvalidReference(request.reference.clone()));
        }
        let name = PackageName::from_reference(&request.reference);
        if !name.is_path_safe() {
            return Err(InstallError::InvalidReference(request.reference.clone()));
        }
        let origin = Origin::resolve(&request.reference)?;
        tracing::info!(%name, %origin, "installing");

        let checkout = acquire(
            ctx,
            &AcquireRequest {
                name: name.as_str(),
                origin: &origin,
                branch: request.branch.as_deref(),
                patches: request.patches.as_deref(),
            },
        )?;

        let build_system = build::build(ctx, &checkout.dir, &name, request.static_link)?;
        let binary = locate(
            ctx.probe.as_ref(),
            &checkout.dir,
            &name,
            request.static_link,
        )?;
        let destination = install_binary(ctx, &binary, &name, request.scope, request.yes)?;
        ctx.reporter.info(&format!(
            "Installed: {} -> {}",
            binary.display(),
            destination.display()
        ));

        let record = PackageRecord {
            name,
            repo: request.reference.clone(),
            build_system,
            hash: checkout.commit,
            local: request.scope.is_local(),
            static_link: request.static_link,
            branch: request.branch.clone(),
            installed_at: Some(Utc::now()),
        };
        if let Err(e) = self.registry.upsert(record.clone()) {
            ctx.reporter
                .warning(&format!("Could not update package list: {e}"));
        }

        Ok(Installed {
            record,
            destination,
            elapsed: start.elapsed(),
        })
    }
}

/// Outcome of a batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Packages installed.
    pub installed: Vec<Installed>,
    /// Packages that failed or were cancelled, by reference.
    pub failed: Vec<(String, InstallError)>,
    /// Packages never started because the batch was interrupted.
    pub skipped: usize,
}

impl BatchReport {
    /// Failures that were not operator decisions.
    pub fn error_count(&self) -> usize {
        self.failed
            .iter()
            .filter(|(_, e)| !e.is_cancellation())
            .count()
    }
}

/// Install `requests` one at a time.
///
/// `interrupted` is checked before each package; once it returns true the
/// remaining packages are skipped. A package already running is not stopped.
pub fn install_batch(
    pipeline: &dyn Pipeline,
    reporter: &dyn Reporter,
    requests: &[InstallRequest],
    interrupted: &dyn Fn() -> bool,
) -> BatchReport {
    let start = Instant::now();
    let mut report = BatchReport::default();

    for (i, request) in requests.iter().enumerate() {
        if interrupted() {
            report.skipped = requests.len() - i;
            reporter.warning(&format!(
                "Interrupted; skipping {} remaining package(s)",
                report.skipped
            ));
            break;
        }

        reporter.section(&format!("Installing {}", request.reference));
        match pipeline.install(request) {
            Ok(installed) => {
                reporter.done(
                    &installed.record.name,
                    &format!("in {:.2}s", installed.elapsed.as_secs_f64()),
                );
                report.installed.push(installed);
            }
            Err(e) if e.is_cancellation() => {
                reporter.info(&format!("{}: {e}", request.reference));
                report.failed.push((request.reference.clone(), e));
            }
            Err(e) => {
                reporter.failed(&request.reference, &e.to_string());
                report.failed.push((request.reference.clone(), e));
            }
        }
    }

    if requests.len() > 1 {
        reporter.summary(
            report.installed.len(),
            "installed",
            start.elapsed().as_secs_f64(),
        );
    }
    report
}
