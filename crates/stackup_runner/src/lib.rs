//! # stackup_runner
//!
//! Container-compose process invocation for stackup.
//!
//! The runner launches a compose tool (`docker-compose`, `docker compose`,
//! `podman-compose` or any other program) as a child process, forwards the
//! selected output stream(s) to the console line by line, and waits for the
//! child to exit.
//!
//! # Features
//!
//! - **Stream Selection**: forward stderr (default), stdout, or both
//! - **Runtime Presets**: docker-compose, the docker compose plugin, podman-compose
//! - **Dry-Run Mode**: log the command without spawning it
//! - **CI Integration**: timestamped line prefixes for CI logs
//! - **Mock Runner**: for testing without an installed compose tool
//!
//! # Example
//!
//! ```rust,no_run
//! use stackup_runner::{CliComposeRunner, CliRunnerOptions, ComposeConfig, ComposeRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = CliComposeRunner::new(CliRunnerOptions::default());
//!     let config = ComposeConfig::default().compose_file("docker-compose.yml");
//!
//!     let report = runner.invoke(&config).await?;
//!     println!("{} line(s), exit {:?}", report.lines_forwarded, report.exit_code);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod lines;
pub mod mock;
pub mod runner;

pub use cli::{CliComposeRunner, CliRunnerOptions, LogHandler, LogLine, LogStream};
pub use config::{ComposeConfig, ComposeRuntime, StreamSelection};
pub use error::{RunnerError, RunnerResult};
pub use lines::StreamLines;
pub use mock::{CapturedCall, MockComposeRunner, MockResponse};
pub use runner::{ComposeRunner, InvocationReport, InvocationState};
