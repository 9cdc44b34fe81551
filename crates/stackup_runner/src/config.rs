//! Compose invocation configuration types.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

/// Compose tool flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComposeRuntime {
    /// Standalone `docker-compose`
    DockerCompose,
    /// `docker compose` plugin
    DockerPlugin,
    /// `podman-compose`
    PodmanCompose,
}

impl ComposeRuntime {
    /// Get the CLI program name.
    pub fn program(&self) -> &'static str {
        match self {
            Self::DockerCompose => "docker-compose",
            Self::DockerPlugin => "docker",
            Self::PodmanCompose => "podman-compose",
        }
    }

    /// Arguments placed before everything else.
    pub fn base_args(&self) -> &'static [&'static str] {
        match self {
            Self::DockerPlugin => &["compose"],
            Self::DockerCompose | Self::PodmanCompose => &[],
        }
    }

    /// Probe order used by [`ComposeRuntime::detect`].
    pub fn all() -> [ComposeRuntime; 3] {
        [Self::DockerCompose, Self::DockerPlugin, Self::PodmanCompose]
    }

    /// Detect the first runtime that answers `version`.
    pub fn detect() -> Option<Self> {
        Self::all().into_iter().find(|runtime| runtime.is_available())
    }

    /// Check if this runtime is installed and runnable.
    pub fn is_available(&self) -> bool {
        probe_version(self.program(), self.base_args())
    }
}

/// Run `<program> <base_args> version` quietly and report whether it succeeded.
pub(crate) fn probe_version<S: AsRef<std::ffi::OsStr>>(program: &str, base_args: &[S]) -> bool {
    Command::new(program)
        .args(base_args)
        .arg("version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

impl std::fmt::Display for ComposeRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DockerPlugin => write!(f, "docker compose"),
            other => write!(f, "{}", other.program()),
        }
    }
}

/// Which child stream(s) get forwarded to the console.
///
/// Streams that are not forwarded are inherited by the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamSelection {
    /// Forward the diagnostic stream only
    #[default]
    Stderr,
    /// Forward standard output only
    Stdout,
    /// Forward both, each on its own reader
    Both,
}

impl StreamSelection {
    pub fn forwards_stdout(&self) -> bool {
        matches!(self, Self::Stdout | Self::Both)
    }

    pub fn forwards_stderr(&self) -> bool {
        matches!(self, Self::Stderr | Self::Both)
    }
}

/// Configuration of a single compose invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeConfig {
    /// Program to execute
    pub program: String,
    /// Leading arguments (e.g. `compose` for the docker plugin)
    pub base_args: Vec<String>,
    /// Compose file passed as `-f <file>`
    pub compose_file: Option<PathBuf>,
    /// Subcommand and its arguments
    pub args: Vec<String>,
    /// Working directory for the child (default: current directory)
    pub workdir: Option<PathBuf>,
    /// Extra environment variables for the child
    pub env: BTreeMap<String, String>,
    /// Forwarded stream(s)
    pub stream: StreamSelection,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self::for_runtime(ComposeRuntime::DockerCompose)
    }
}

impl ComposeConfig {
    /// Default compose arguments: bring services up.
    pub const DEFAULT_ARGS: &'static [&'static str] = &["up"];

    /// Configuration for an arbitrary program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
            compose_file: None,
            args: Self::DEFAULT_ARGS.iter().map(|s| s.to_string()).collect(),
            workdir: None,
            env: BTreeMap::new(),
            stream: StreamSelection::default(),
        }
    }

    /// Configuration for a known compose runtime.
    pub fn for_runtime(runtime: ComposeRuntime) -> Self {
        let mut config = Self::new(runtime.program());
        config.base_args = runtime.base_args().iter().map(|s| s.to_string()).collect();
        config
    }

    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self.base_args.clear();
        self
    }

    pub fn args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn compose_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.compose_file = Some(path.into());
        self
    }

    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn stream(mut self, stream: StreamSelection) -> Self {
        self.stream = stream;
        self
    }

    /// Full argument list after the program name.
    pub fn command_args(&self) -> Vec<String> {
        let mut args = self.base_args.clone();
        if let Some(file) = &self.compose_file {
            args.push("-f".to_string());
            args.push(file.to_string_lossy().into_owned());
        }
        args.extend(self.args.iter().cloned());
        args
    }

    /// Format the command line for logging.
    pub fn command_line(&self) -> String {
        let mut cmd = self.program.clone();
        for arg in self.command_args() {
            if arg.contains(' ') || arg.contains('=') {
                cmd.push_str(&format!(" '{}'", arg));
            } else {
                cmd.push_str(&format!(" {}", arg));
            }
        }
        cmd
    }
}
