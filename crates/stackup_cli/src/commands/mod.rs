//! CLI command definitions.
//!
//! Each subcommand assembles a [`DeployConfig`] from flags and environment
//! variables first, then runs one or both deploy steps.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use stackup_core::{CoreError, DeployConfig, VariableSources, DEFAULT_ENV_PREFIX, DEFAULT_TEMPLATE};
use stackup_runner::{
    CliComposeRunner, CliRunnerOptions, ComposeConfig, ComposeRuntime, RunnerError,
    StreamSelection,
};

pub mod deploy;
pub mod render;
pub mod up;

/// stackup - render a compose template and bring the services up
#[derive(Parser)]
#[command(name = "stackup")]
#[command(version, about = "Render a compose template and bring the services up")]
#[command(long_about = r#"
stackup substitutes $name / ${name} placeholders in a compose file, writes
the result back over the file, then runs the compose tool against it.

WORKFLOWS:
  deploy  → render the template, then run compose
  render  → render the template only
  up      → run compose only

VARIABLES (lowest to highest precedence):
  --inherit-env        whole process environment
  --vars-file <PATH>   YAML, JSON or TOML table of scalars
  STACKUP_VAR_<NAME>   prefixed environment variables
  --var NAME=VALUE     explicit assignments

EXIT CODES:
  0 - Success (whatever the compose tool's own exit status)
  1 - General error
  2 - Invalid or missing arguments
  3 - Template error
  4 - Compose tool could not be started
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Do not echo the rendered template
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Prefix forwarded lines with timestamp and stream (implied when CI is set)
    #[arg(long, global = true)]
    pub ci: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render the template, then run the compose tool
    Deploy(deploy::DeployArgs),

    /// Render the template in place
    Render(render::RenderArgs),

    /// Run the compose tool without rendering
    Up(up::UpArgs),
}

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Copy)]
pub struct GlobalOptions {
    pub quiet: bool,
    pub ci: bool,
}

impl From<&Cli> for GlobalOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            quiet: cli.quiet,
            ci: cli.ci,
        }
    }
}

/// Template location and substitution sources.
#[derive(Args, Debug, Clone)]
pub struct TemplateArgs {
    /// Template file, rendered in place
    #[arg(short, long, env = "STACKUP_TEMPLATE", default_value = DEFAULT_TEMPLATE)]
    pub template: PathBuf,

    /// Substitution value (repeatable)
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,

    /// File of substitution values
    #[arg(long, env = "STACKUP_VARS_FILE")]
    pub vars_file: Option<PathBuf>,

    /// Use every environment variable as a substitution value
    #[arg(long)]
    pub inherit_env: bool,

    /// Prefix of environment variables used as substitution values
    #[arg(long, env = "STACKUP_VAR_PREFIX", default_value = DEFAULT_ENV_PREFIX)]
    pub env_prefix: String,
}

impl TemplateArgs {
    pub fn sources(&self) -> VariableSources {
        let mut sources = VariableSources::new()
            .inherit_env(self.inherit_env)
            .env_prefix(Some(self.env_prefix.clone()));
        if let Some(file) = &self.vars_file {
            sources = sources.vars_file(file);
        }
        for assignment in &self.vars {
            sources = sources.assign(assignment.clone());
        }
        sources
    }
}

/// Compose tool selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RuntimeArg {
    /// Probe docker-compose, docker compose, podman-compose in order
    Auto,
    /// Standalone docker-compose
    DockerCompose,
    /// docker compose plugin
    Docker,
    /// podman-compose
    Podman,
}

impl RuntimeArg {
    fn resolve(self) -> Result<ComposeRuntime, RunnerError> {
        match self {
            Self::Auto => ComposeRuntime::detect().ok_or_else(|| {
                RunnerError::RuntimeNotAvailable(
                    "none of docker-compose, docker compose, podman-compose answered".to_string(),
                )
            }),
            Self::DockerCompose => Ok(ComposeRuntime::DockerCompose),
            Self::Docker => Ok(ComposeRuntime::DockerPlugin),
            Self::Podman => Ok(ComposeRuntime::PodmanCompose),
        }
    }
}

/// Forwarded child stream(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StreamArg {
    Stderr,
    Stdout,
    Both,
}

impl From<StreamArg> for StreamSelection {
    fn from(arg: StreamArg) -> Self {
        match arg {
            StreamArg::Stderr => StreamSelection::Stderr,
            StreamArg::Stdout => StreamSelection::Stdout,
            StreamArg::Both => StreamSelection::Both,
        }
    }
}

/// Compose invocation flags.
#[derive(Args, Debug, Clone)]
pub struct ComposeArgs {
    /// Compose tool
    #[arg(long, value_enum, default_value_t = RuntimeArg::DockerCompose)]
    pub runtime: RuntimeArg,

    /// Program to run instead of the runtime's default
    #[arg(long, env = "STACKUP_COMPOSE_PROGRAM")]
    pub compose_program: Option<String>,

    /// Child stream(s) forwarded to the console
    #[arg(long, value_enum, default_value_t = StreamArg::Stderr)]
    pub stream: StreamArg,

    /// Working directory for the compose tool
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// Do not pass the template as `-f <template>`
    #[arg(long)]
    pub no_compose_file: bool,

    /// Print the compose command without running it
    #[arg(long)]
    pub dry_run: bool,

    /// Compose arguments (default: up)
    #[arg(last = true, value_name = "ARGS")]
    pub compose_args: Vec<String>,
}

impl ComposeArgs {
    pub fn compose_config(&self) -> Result<ComposeConfig, RunnerError> {
        let mut config = ComposeConfig::for_runtime(self.runtime.resolve()?);
        if let Some(program) = &self.compose_program {
            config = config.program(program.clone());
        }
        if !self.compose_args.is_empty() {
            config = config.args(self.compose_args.clone());
        }
        if let Some(dir) = &self.workdir {
            config = config.workdir(dir);
        }
        Ok(config.stream(self.stream.into()))
    }

    pub fn runner(&self, global: GlobalOptions) -> CliComposeRunner {
        let mut options = CliRunnerOptions::new();
        if global.ci {
            options = options.ci_mode(true);
        }
        if self.dry_run {
            options = options.dry_run();
        }
        CliComposeRunner::new(options)
    }
}

/// Build the deploy configuration from parsed flags.
pub fn build_config(
    template: &TemplateArgs,
    compose: Option<&ComposeArgs>,
    global: GlobalOptions,
) -> Result<DeployConfig> {
    assemble(template, template.sources(), compose, global)
}

/// Build the configuration for a compose run that renders nothing.
///
/// Substitution sources are not resolved, so a stale variables file or a
/// malformed `--var` cannot stop the compose tool from running.
pub fn build_invoke_config(
    template: &TemplateArgs,
    compose: &ComposeArgs,
    global: GlobalOptions,
) -> Result<DeployConfig> {
    assemble(
        template,
        VariableSources::new().env_prefix(None),
        Some(compose),
        global,
    )
}

fn assemble(
    template: &TemplateArgs,
    sources: VariableSources,
    compose: Option<&ComposeArgs>,
    global: GlobalOptions,
) -> Result<DeployConfig> {
    let mut builder = DeployConfig::builder()
        .template_path(&template.template)
        .sources(sources)
        .echo_rendered(!global.quiet);

    if let Some(compose) = compose {
        let compose_config = compose.compose_config().map_err(CoreError::from)?;
        builder = builder
            .compose(compose_config)
            .pass_compose_file(!compose.no_compose_file);
    }

    builder.build().context("Failed to assemble deploy configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_parse_deploy_defaults() {
        let cli = parse(&["stackup", "deploy"]);
        let Commands::Deploy(args) = cli.command else {
            panic!("expected deploy");
        };
        assert_eq!(args.template.template, PathBuf::from(DEFAULT_TEMPLATE));
        assert_eq!(args.compose.runtime, RuntimeArg::DockerCompose);
        assert_eq!(args.compose.stream, StreamArg::Stderr);
        assert!(args.compose.compose_args.is_empty());
    }

    #[test]
    fn test_parse_trailing_compose_args() {
        let cli = parse(&[
            "stackup", "deploy", "-t", "stack.yml", "--var", "tag=2", "--runtime", "docker",
            "--stream", "both", "--", "up", "-d",
        ]);
        let Commands::Deploy(args) = cli.command else {
            panic!("expected deploy");
        };
        assert_eq!(args.template.vars, vec!["tag=2"]);

        let compose = args.compose.compose_config().unwrap();
        assert_eq!(compose.command_args(), vec!["compose", "up", "-d"]);
        assert_eq!(compose.stream, StreamSelection::Both);
    }

    #[test]
    fn test_compose_program_override() {
        let cli = parse(&["stackup", "up", "--compose-program", "nerdctl"]);
        let Commands::Up(args) = cli.command else {
            panic!("expected up");
        };
        let compose = args.compose.compose_config().unwrap();
        assert_eq!(compose.program, "nerdctl");
        assert_eq!(compose.command_args(), vec!["up"]);
    }

    #[test]
    fn test_build_config_passes_template_to_compose() {
        let cli = parse(&["stackup", "-q", "deploy", "-t", "stack.yml", "--var", "a=1"]);
        let global = GlobalOptions::from(&cli);
        let Commands::Deploy(args) = cli.command else {
            panic!("expected deploy");
        };

        let config = build_config(&args.template, Some(&args.compose), global).unwrap();
        assert!(!config.echo_rendered);
        assert_eq!(config.mapping["a"], "1");
        assert_eq!(
            config.compose_invocation().command_line(),
            "docker-compose -f stack.yml up"
        );
    }

    #[test]
    fn test_build_config_rejects_bad_assignment() {
        let cli = parse(&["stackup", "render", "--var", "oops"]);
        let global = GlobalOptions::from(&cli);
        let Commands::Render(args) = cli.command else {
            panic!("expected render");
        };

        let err = build_config(&args.template, None, global).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::InvalidVariable { .. })
        ));
    }

    #[test]
    fn test_up_ignores_substitution_sources() {
        let cli = parse(&[
            "stackup",
            "up",
            "-t",
            "stack.yml",
            "--var",
            "oops",
            "--vars-file",
            "/nonexistent/vars.yaml",
        ]);
        let global = GlobalOptions::from(&cli);
        let Commands::Up(args) = cli.command else {
            panic!("expected up");
        };

        let config = build_invoke_config(&args.template, &args.compose, global).unwrap();
        assert!(config.mapping.is_empty());
        assert_eq!(
            config.compose_invocation().command_line(),
            "docker-compose -f stack.yml up"
        );
    }
}
