//! # stackup_core
//!
//! Deploy configuration and the render-then-compose pipeline.
//!
//! # Architecture
//!
//! - **Variables**: layered substitution sources (environment, file, flags)
//! - **Config**: a typed [`DeployConfig`] built before anything runs
//! - **Deployer**: renders the template in place, then runs the compose tool
//!
//! # Example
//!
//! ```rust,no_run
//! use stackup_core::{DeployConfig, Deployer, VariableSources};
//! use stackup_runner::{CliComposeRunner, CliRunnerOptions};
//!
//! # async fn run() -> stackup_core::CoreResult<()> {
//! let config = DeployConfig::builder()
//!     .template_path("docker-compose.yml")
//!     .sources(VariableSources::new().assign("tag=1.2.0"))
//!     .build()?;
//!
//! let deployer = Deployer::new(CliComposeRunner::new(CliRunnerOptions::default()));
//! let report = deployer.deploy(&config).await?;
//! println!("exit code: {:?}", report.invocation.exit_code);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod deployer;
pub mod error;
pub mod variables;

pub use config::{DeployConfig, DeployConfigBuilder, DEFAULT_TEMPLATE};
pub use deployer::{DeployReport, Deployer};
pub use error::{CoreError, CoreResult};
pub use variables::{load_vars_file, parse_assignment, VariableSources, DEFAULT_ENV_PREFIX};
