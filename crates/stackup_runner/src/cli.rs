//! CLI-based compose runner.
//!
//! Spawns the compose program as a child process and mirrors the selected
//! stream(s) to the console line by line until the child exits.

use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use crate::config::{probe_version, ComposeConfig};
use crate::error::{RunnerError, RunnerResult};
use crate::lines::StreamLines;
use crate::runner::{ComposeRunner, InvocationReport, InvocationState};

/// Log output from a compose invocation.
#[derive(Debug, Clone)]
pub struct LogLine {
    pub timestamp: chrono::DateTime<Utc>,
    pub stream: LogStream,
    pub message: String,
}

/// Log stream type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

impl std::fmt::Display for LogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => write!(f, "stdout"),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

/// Log handler callback type.
pub type LogHandler = Arc<dyn Fn(LogLine) + Send + Sync>;

/// CLI-based compose runner options.
#[derive(Debug, Clone)]
pub struct CliRunnerOptions {
    /// Dry-run mode (print the command without executing)
    pub dry_run: bool,
    /// CI mode (prefix forwarded lines with timestamp and stream)
    pub ci_mode: bool,
    /// Write forwarded lines to the console
    pub echo: bool,
}

impl Default for CliRunnerOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            ci_mode: std::env::var("CI").is_ok(),
            echo: true,
        }
    }
}

impl CliRunnerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn ci_mode(mut self, enabled: bool) -> Self {
        self.ci_mode = enabled;
        self
    }

    /// Disable console output; a log handler still receives every line.
    pub fn silent(mut self) -> Self {
        self.echo = false;
        self
    }
}

/// Writes forwarded lines to the console and the optional handler.
#[derive(Clone)]
struct LineForwarder {
    ci_mode: bool,
    echo: bool,
    handler: Option<LogHandler>,
}

impl LineForwarder {
    /// Forward every line of `lines`, returning how many were written.
    fn forward<R: Read>(&self, lines: StreamLines<R>, stream: LogStream) -> RunnerResult<usize> {
        let mut count = 0;
        for line in lines {
            let message = line?;
            self.emit(LogLine {
                timestamp: Utc::now(),
                stream,
                message,
            });
            count += 1;
        }
        debug!("{} closed after {} line(s)", stream, count);
        Ok(count)
    }

    fn emit(&self, line: LogLine) {
        if self.echo {
            let text = console_text(&line, self.ci_mode);
            // CI logs are collected from stdout only.
            if self.ci_mode || line.stream == LogStream::Stdout {
                println!("{}", text);
            } else {
                eprintln!("{}", text);
            }
        }

        if let Some(handler) = &self.handler {
            handler(line);
        }
    }
}

/// Console rendering of a forwarded line; CI mode adds timestamp and stream.
fn console_text(line: &LogLine, ci_mode: bool) -> String {
    if ci_mode {
        format!(
            "[{}] [{}] {}",
            line.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            line.stream,
            line.message
        )
    } else {
        line.message.clone()
    }
}

/// CLI-based compose runner.
#[derive(Clone)]
pub struct CliComposeRunner {
    options: CliRunnerOptions,
    log_handler: Option<LogHandler>,
}

impl Default for CliComposeRunner {
    fn default() -> Self {
        Self::new(CliRunnerOptions::default())
    }
}

impl CliComposeRunner {
    pub fn new(options: CliRunnerOptions) -> Self {
        Self {
            options,
            log_handler: None,
        }
    }

    /// Set a log handler receiving every forwarded line.
    pub fn with_log_handler(mut self, handler: LogHandler) -> Self {
        self.log_handler = Some(handler);
        self
    }

    /// Check if dry-run mode is enabled.
    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    fn forwarder(&self) -> LineForwarder {
        LineForwarder {
            ci_mode: self.options.ci_mode,
            echo: self.options.echo,
            handler: self.log_handler.clone(),
        }
    }

    fn build_command(config: &ComposeConfig) -> Command {
        let mut cmd = Command::new(&config.program);
        cmd.args(config.command_args());
        if let Some(dir) = &config.workdir {
            cmd.current_dir(dir);
        }
        cmd.envs(&config.env);
        cmd.stdin(Stdio::inherit());
        cmd.stdout(if config.stream.forwards_stdout() {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });
        cmd.stderr(if config.stream.forwards_stderr() {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });
        cmd
    }

    /// Spawn, stream until end of output, then wait for exit. Blocks.
    fn execute(&self, config: &ComposeConfig, run_id: Uuid) -> RunnerResult<InvocationReport> {
        let command = config.command_line();
        let mut state = InvocationState::Created;
        debug!(?state, "Executing: {}", command);

        let started_at = Utc::now();
        let mut child = Self::build_command(config)
            .spawn()
            .map_err(|source| RunnerError::SpawnFailed {
                program: config.program.clone(),
                source,
            })?;

        state.advance();
        debug!(?state, pid = child.id(), "Forwarding {:?}", config.stream);

        let forwarder = self.forwarder();
        let mut reader_panicked = false;
        let forwarded = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => {
                let stdout_handle = std::thread::spawn({
                    let forwarder = forwarder.clone();
                    move || forwarder.forward(StreamLines::new(stdout), LogStream::Stdout)
                });
                let stderr_count = forwarder.forward(StreamLines::new(stderr), LogStream::Stderr);
                match stdout_handle.join() {
                    Ok(stdout_count) => {
                        stdout_count.and_then(|out| stderr_count.map(|err| out + err))
                    }
                    Err(_) => {
                        reader_panicked = true;
                        stderr_count
                    }
                }
            }
            (Some(stdout), None) => forwarder.forward(StreamLines::new(stdout), LogStream::Stdout),
            (None, Some(stderr)) => forwarder.forward(StreamLines::new(stderr), LogStream::Stderr),
            (None, None) => Ok(0),
        };

        let status = child.wait().map_err(|source| RunnerError::Wait {
            program: config.program.clone(),
            source,
        })?;
        state.advance();

        if reader_panicked {
            warn!(?state, "stdout reader panicked; {} was still waited on", config.program);
            return Err(RunnerError::Join("stdout reader panicked".to_string()));
        }
        let lines_forwarded = forwarded?;
        let finished_at = Utc::now();
        let duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;
        let exit_code = status.code();

        if status.success() {
            info!(?state, "{} finished in {}ms", config.program, duration_ms);
        } else {
            warn!(
                ?state,
                "{} exited with {} after {}ms",
                config.program,
                exit_code.map_or_else(|| "a signal".to_string(), |c| format!("code {}", c)),
                duration_ms
            );
        }

        Ok(InvocationReport {
            run_id,
            command,
            lines_forwarded,
            exit_code,
            dry_run: false,
            started_at,
            finished_at,
            duration_ms,
        })
    }
}

#[async_trait]
impl ComposeRunner for CliComposeRunner {
    async fn is_available(&self, config: &ComposeConfig) -> RunnerResult<bool> {
        let program = config.program.clone();
        let base_args = config.base_args.clone();
        tokio::task::spawn_blocking(move || probe_version(&program, &base_args))
            .await
            .map_err(|e| RunnerError::Join(e.to_string()))
    }

    async fn invoke(&self, config: &ComposeConfig) -> RunnerResult<InvocationReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("compose", %run_id);
        let command = config.command_line();

        if self.options.dry_run {
            info!(parent: &span, "[DRY-RUN] Would execute: {}", command);
            return Ok(InvocationReport::dry_run(run_id, command));
        }

        info!(parent: &span, "Running: {}", command);

        let runner = self.clone();
        let config = config.clone();
        tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            runner.execute(&config, run_id)
        })
        .await
        .map_err(|e| RunnerError::Join(e.to_string()))?
    }
}
