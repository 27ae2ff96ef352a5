use anyhow::{Context as _, Result};
use kiln_core::{Context, Registry};

/// Remove packages. Unknown names are reported but do not fail the command.
pub fn remove(ctx: &Context, packages: &[String]) -> Result<()> {
    let registry = Registry::open(ctx.layout.registry_path());
    for name in packages {
        kiln_core::remove::remove(ctx, &registry, name)
            .with_context(|| format!("Failed to remove {name}"))?;
    }
    Ok(())
}
