//! Up command - Run the compose tool without rendering.

use anyhow::{Context, Result};
use clap::Args;

use stackup_core::Deployer;

use super::{build_invoke_config, ComposeArgs, GlobalOptions, TemplateArgs};

#[derive(Args, Debug)]
pub struct UpArgs {
    #[command(flatten)]
    pub template: TemplateArgs,

    #[command(flatten)]
    pub compose: ComposeArgs,
}

pub async fn execute(args: UpArgs, global: GlobalOptions) -> Result<()> {
    let config = build_invoke_config(&args.template, &args.compose, global)?;

    let deployer = Deployer::new(args.compose.runner(global));
    deployer
        .invoke(&config)
        .await
        .context("Failed to run the compose tool")?;

    Ok(())
}
