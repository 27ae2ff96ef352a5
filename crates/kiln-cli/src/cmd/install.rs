use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use kiln_core::pipeline::install_batch;
use kiln_core::{Context, InstallPipeline, InstallRequest, InstallScope};

/// Flags shared by every package in one `kiln install`.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    pub local: bool,
    pub branch: Option<String>,
    pub patches: Option<PathBuf>,
    pub yes: bool,
    pub pkgdeps: Option<PathBuf>,
    pub static_link: bool,
}

/// Package references from a dependency list: one per line, blank lines and
/// `--` lines ignored.
pub fn parse_pkgdeps(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("--"))
        .map(String::from)
        .collect()
}

fn read_pkgdeps(ctx: &Context, path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_pkgdeps(&contents),
        Err(e) => {
            ctx.reporter.warning(&format!(
                "Could not read dependency list {}: {e}",
                path.display()
            ));
            Vec::new()
        }
    }
}

/// Install packages
pub fn install(
    ctx: Context,
    packages: &[String],
    opts: &InstallOptions,
    interrupted: &dyn Fn() -> bool,
) -> Result<()> {
    let mut references = packages.to_vec();
    if let Some(path) = &opts.pkgdeps {
        references.extend(read_pkgdeps(&ctx, path));
    }
    if references.is_empty() {
        bail!("No packages specified");
    }

    let requests: Vec<InstallRequest> = references
        .into_iter()
        .map(|reference| InstallRequest {
            branch: opts.branch.clone(),
            patches: opts.patches.clone(),
            scope: InstallScope::from_local(opts.local),
            static_link: opts.static_link,
            yes: opts.yes,
            ..InstallRequest::new(reference)
        })
        .collect();

    let reporter = ctx.reporter.clone();
    let pipeline = InstallPipeline::new(ctx);
    let report = install_batch(&pipeline, reporter.as_ref(), &requests, interrupted);

    let errors = report.error_count();
    if errors > 0 {
        bail!("{errors} package(s) failed to install");
    }
    Ok(())
}
