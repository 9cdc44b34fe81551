//! stackup CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid or missing arguments
//! - 3: Template error
//! - 4: Compose tool could not be started

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stackup_core::CoreError;

mod commands;

use commands::{Cli, Commands, GlobalOptions};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const TEMPLATE_ERROR: u8 = 3;
    pub const COMPOSE_ERROR: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so the rendered template on stdout stays clean.
    let default_level = if cli.verbose { "stackup=debug" } else { "stackup=info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},warn", default_level)));
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let global = GlobalOptions::from(&cli);
    let result = match cli.command {
        Commands::Deploy(args) => commands::deploy::execute(args, global).await,
        Commands::Render(args) => commands::render::execute(args, global).await,
        Commands::Up(args) => commands::up::execute(args, global).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(categorize_error(&e))
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<CoreError>() {
        Some(CoreError::MissingArgument(_))
        | Some(CoreError::InvalidVariable { .. })
        | Some(CoreError::VariablesFile { .. }) => ExitCodes::INVALID_ARGS,
        Some(CoreError::Template(_)) => ExitCodes::TEMPLATE_ERROR,
        Some(CoreError::Runner(err)) if err.is_spawn_failure() => ExitCodes::COMPOSE_ERROR,
        _ => ExitCodes::GENERAL_ERROR,
    }
}
