//! Error types for the core module.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while configuring or running a deploy.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    #[error("Invalid variable '{input}': {message}")]
    InvalidVariable { input: String, message: String },

    #[error("Invalid variables file {path:?}: {message}")]
    VariablesFile { path: PathBuf, message: String },

    #[error("Template error: {0}")]
    Template(#[from] stackup_templates::TemplateError),

    #[error("Compose error: {0}")]
    Runner(#[from] stackup_runner::RunnerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
