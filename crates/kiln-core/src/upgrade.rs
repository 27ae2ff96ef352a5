//! Upgrade reconciliation.
//!
//! For each recorded package, ask the remote for its current head and
//! reinstall through the regular pipeline when it differs from the recorded
//! commit. Packages are handled one at a time and a failure never stops the
//! rest.

use std::time::Instant;

use kiln_schema::{CommitId, PackageRecord};

use crate::context::Context;
use crate::pipeline::{InstallRequest, Pipeline};
use crate::registry::Registry;
use crate::source::Origin;

/// Which packages to reconcile and how.
#[derive(Debug, Clone, Default)]
pub struct UpgradeOptions {
    /// Only packages installed to the per-user bin directory.
    pub local_only: bool,
    /// Skip confirmation prompts during reinstall.
    pub yes: bool,
    /// Restrict to these package names; empty means all.
    pub names: Vec<String>,
}

impl UpgradeOptions {
    fn selects(&self, record: &PackageRecord) -> bool {
        (!self.local_only || record.local)
            && (self.names.is_empty() || self.names.iter().any(|n| record.name == n.as_str()))
    }
}

/// What happened to one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Remote head equals the recorded commit.
    UpToDate,
    /// Reinstalled from a newer head.
    Upgraded {
        /// Recorded commit before the upgrade.
        from: CommitId,
        /// Remote head that was installed.
        to: CommitId,
    },
    /// The check or the reinstall failed.
    Failed(String),
}

/// Per-package outcomes in registry order.
#[derive(Debug, Default)]
pub struct UpgradeReport {
    /// `(name, outcome)` for each reconciled package.
    pub outcomes: Vec<(String, Outcome)>,
    /// Packages never reached because the run was interrupted.
    pub skipped: usize,
}

impl UpgradeReport {
    /// Number of packages reinstalled.
    pub fn upgraded(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Upgraded { .. }))
    }

    /// Number of packages whose check or reinstall failed.
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Decide whether `record` needs reinstalling.
///
/// Returns the remote head when it differs from the recorded commit. A
/// record whose commit was never known and a remote that cannot be read are
/// both unknown, which counts as equal.
fn check(ctx: &Context, record: &PackageRecord) -> Result<Option<CommitId>, String> {
    let origin = Origin::resolve(&record.repo).map_err(|e| e.to_string())?;
    let remote = match ctx.vcs.remote_head(&origin, record.branch.as_deref()) {
        Ok(remote) => remote,
        Err(e) if record.hash.is_empty() => {
            tracing::debug!(name = %record.name, "remote head unreadable, recorded hash empty: {e}");
            CommitId::unknown()
        }
        Err(e) => return Err(format!("error checking updates: {e}")),
    };
    Ok((remote != record.hash).then_some(remote))
}

/// Reconcile every selected record against its remote.
///
/// `interrupted` is checked before each package.
pub fn reconcile(
    ctx: &Context,
    registry: &Registry,
    pipeline: &dyn Pipeline,
    options: &UpgradeOptions,
    interrupted: &dyn Fn() -> bool,
) -> UpgradeReport {
    let reporter = &ctx.reporter;
    let start = Instant::now();
    let mut report = UpgradeReport::default();

    let selected: Vec<PackageRecord> = registry
        .load()
        .into_iter()
        .filter(|r| options.selects(r))
        .collect();

    if selected.is_empty() {
        reporter.info(if options.local_only {
            "No local packages to upgrade"
        } else {
            "No packages to upgrade"
        });
        return report;
    }
    reporter.info(&format!("Found {} packages to check", selected.len()));

    let total = selected.len();
    for (i, record) in selected.iter().enumerate() {
        if interrupted() {
            report.skipped = total - i;
            reporter.warning(&format!(
                "Interrupted; skipping {} remaining package(s)",
                report.skipped
            ));
            break;
        }

        reporter.section(&format!("[{}/{total}] {}", i + 1, record.name));
        let outcome = match check(ctx, record) {
            Err(e) => {
                reporter.failed(&record.name, &e);
                Outcome::Failed(e)
            }
            Ok(None) => {
                reporter.info(&format!("{} is already up to date", record.name));
                Outcome::UpToDate
            }
            Ok(Some(remote)) => {
                reporter.info(&format!(
                    "Updating {} ({} -> {})",
                    record.name,
                    record.hash.short(),
                    remote.short()
                ));
                match pipeline.install(&InstallRequest::from_record(record, options.yes)) {
                    Ok(installed) => {
                        reporter.done(
                            &record.name,
                            &format!("in {:.2}s", installed.elapsed.as_secs_f64()),
                        );
                        Outcome::Upgraded {
                            from: record.hash.clone(),
                            to: remote,
                        }
                    }
                    Err(e) => {
                        let reason = format!("failed to upgrade: {e}");
                        reporter.failed(&record.name, &reason);
                        Outcome::Failed(reason)
                    }
                }
            }
        };
        report.outcomes.push((record.name.to_string(), outcome));
    }

    reporter.summary(report.upgraded(), "upgraded", start.elapsed().as_secs_f64());
    report
}
