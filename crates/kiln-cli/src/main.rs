//! kiln - build and install tools from source

use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use kiln_cli::cmd;
use kiln_cli::cmd::install::InstallOptions;
use kiln_cli::ui::{Console, Output};
use kiln_cli::{Cli, Commands};
use kiln_core::{Context, Reporter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let layout = cli.paths.layout()?;
    let output = Output::new();
    if let Err(e) = layout.ensure() {
        output.warning(&format!("Could not create kiln directories: {e}"));
    }

    let token = CancellationToken::new();
    tokio::spawn(watch_interrupts(token.clone(), output.clone()));

    tokio::task::spawn_blocking(move || {
        let interrupted = || token.is_cancelled();
        let ctx = Context::host(
            layout,
            Arc::new(Console::new(output.clone())),
            Arc::new(output),
        );

        match cli.command {
            Commands::Install {
                packages,
                local,
                branch,
                patches,
                yes,
                pkgdeps,
                static_link,
            } => {
                let opts = InstallOptions {
                    local,
                    branch,
                    patches,
                    yes,
                    pkgdeps,
                    static_link,
                };
                cmd::install::install(ctx, &packages, &opts, &interrupted)
            }
            Commands::Remove { packages } => cmd::remove::remove(&ctx, &packages),
            Commands::List => cmd::list::list(&ctx.layout),
            Commands::Upgrade {
                packages,
                local,
                yes,
            } => cmd::upgrade::upgrade(&ctx, &packages, local, yes, &interrupted),
        }
    })
    .await
    .context("command thread panicked")?
}

/// First ctrl-c lets the current package finish; the second exits.
async fn watch_interrupts(token: CancellationToken, output: Output) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    token.cancel();
    output.warning("Interrupted; finishing the current package (press ctrl-c again to abort)");

    if tokio::signal::ctrl_c().await.is_ok() {
        std::process::exit(130);
    }
}
