//! Deploy command - Render the template, then run the compose tool.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use stackup_core::Deployer;

use super::{build_config, ComposeArgs, GlobalOptions, TemplateArgs};

#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub template: TemplateArgs,

    #[command(flatten)]
    pub compose: ComposeArgs,
}

pub async fn execute(args: DeployArgs, global: GlobalOptions) -> Result<()> {
    let config = build_config(&args.template, Some(&args.compose), global)?;
    info!("Deploying {:?}", config.template_path);

    let deployer = Deployer::new(args.compose.runner(global));
    let report = deployer
        .deploy(&config)
        .await
        .with_context(|| format!("Deploy of {:?} failed", config.template_path))?;

    match report.invocation.exit_code {
        Some(0) => info!("Compose finished cleanly"),
        Some(code) => info!("Compose exited with code {}", code),
        None if report.invocation.dry_run => {}
        None => info!("Compose terminated by a signal"),
    }

    Ok(())
}
