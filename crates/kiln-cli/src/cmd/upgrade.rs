use anyhow::{Result, bail};
use kiln_core::upgrade::{UpgradeOptions, reconcile};
use kiln_core::{Context, InstallPipeline};

/// Upgrade packages whose upstream has moved
pub fn upgrade(
    ctx: &Context,
    packages: &[String],
    local: bool,
    yes: bool,
    interrupted: &dyn Fn() -> bool,
) -> Result<()> {
    let options = UpgradeOptions {
        local_only: local,
        yes,
        names: packages.to_vec(),
    };
    let pipeline = InstallPipeline::new(ctx.clone());
    let report = reconcile(ctx, pipeline.registry(), &pipeline, &options, interrupted);

    let failed = report.failed();
    if failed > 0 {
        bail!("{failed} package(s) failed to upgrade");
    }
    Ok(())
}
