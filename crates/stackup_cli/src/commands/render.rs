//! Render command - Render the template in place.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use stackup_core::Deployer;
use stackup_runner::CliComposeRunner;

use super::{build_config, GlobalOptions, TemplateArgs};

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub template: TemplateArgs,
}

pub async fn execute(args: RenderArgs, global: GlobalOptions) -> Result<()> {
    let config = build_config(&args.template, None, global)?;

    let deployer = Deployer::new(CliComposeRunner::default());
    let report = deployer
        .render(&config)
        .with_context(|| format!("Failed to render {:?}", config.template_path))?;

    if report.is_complete() {
        info!("All placeholders in {:?} resolved", report.path);
    }

    Ok(())
}
