//! Mock compose runner for testing.
//!
//! Provides a configurable mock implementation of the ComposeRunner trait
//! for use in unit tests without requiring an installed compose tool.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::cli::{LogHandler, LogLine, LogStream};
use crate::config::ComposeConfig;
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{ComposeRunner, InvocationReport};

/// Predefined mock response for an invocation.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub lines: Vec<String>,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

impl MockResponse {
    pub fn success<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            exit_code: Some(0),
            duration_ms: 100,
        }
    }

    pub fn exit(exit_code: i32) -> Self {
        Self {
            lines: Vec::new(),
            exit_code: Some(exit_code),
            duration_ms: 100,
        }
    }

    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub method: String,
    pub program: String,
    pub args: Vec<String>,
    pub compose_file: Option<PathBuf>,
    pub workdir: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

impl CapturedCall {
    fn from_config(method: &str, config: &ComposeConfig) -> Self {
        Self {
            method: method.to_string(),
            program: config.program.clone(),
            args: config.command_args(),
            compose_file: config.compose_file.clone(),
            workdir: config.workdir.clone(),
            env: config.env.clone(),
        }
    }
}

/// Mock compose runner for testing.
///
/// Captures every call and returns predefined responses, feeding the
/// response lines to the log handler as if the child had printed them.
#[derive(Clone)]
pub struct MockComposeRunner {
    available: Arc<RwLock<bool>>,
    responses: Arc<RwLock<Vec<MockResponse>>>,
    response_index: Arc<AtomicUsize>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    /// Program name to report as missing on spawn.
    simulate_spawn_failure: Arc<RwLock<Option<String>>>,
    log_handler: Option<LogHandler>,
}

impl Default for MockComposeRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockComposeRunner {
    /// Create a new mock runner.
    pub fn new() -> Self {
        Self {
            available: Arc::new(RwLock::new(true)),
            responses: Arc::new(RwLock::new(Vec::new())),
            response_index: Arc::new(AtomicUsize::new(0)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            simulate_spawn_failure: Arc::new(RwLock::new(None)),
            log_handler: None,
        }
    }

    /// Set whether the runner is available.
    pub fn set_available(self, available: bool) -> Self {
        *self.available.write() = available;
        self
    }

    /// Add a mock response for the next invoke call.
    pub fn add_response(self, response: MockResponse) -> Self {
        self.responses.write().push(response);
        self
    }

    /// Set multiple responses.
    pub fn with_responses(self, responses: Vec<MockResponse>) -> Self {
        *self.responses.write() = responses;
        self
    }

    /// Fail every invoke as if the program could not be found.
    pub fn simulate_spawn_failure(self, program: impl Into<String>) -> Self {
        *self.simulate_spawn_failure.write() = Some(program.into());
        self
    }

    /// Set a log handler receiving the response lines.
    pub fn with_log_handler(mut self, handler: LogHandler) -> Self {
        self.log_handler = Some(handler);
        self
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Check if a specific method was called.
    pub fn was_called(&self, method: &str) -> bool {
        self.captured_calls
            .read()
            .iter()
            .any(|c| c.method == method)
    }

    fn record_call(&self, call: CapturedCall) {
        self.captured_calls.write().push(call);
    }

    fn next_response(&self) -> MockResponse {
        let responses = self.responses.read();
        if responses.is_empty() {
            return MockResponse::success(Vec::<String>::new());
        }
        let index = self.response_index.fetch_add(1, Ordering::SeqCst);
        responses
            .get(index % responses.len())
            .cloned()
            .unwrap_or_else(|| MockResponse::success(Vec::<String>::new()))
    }
}

#[async_trait]
impl ComposeRunner for MockComposeRunner {
    async fn is_available(&self, config: &ComposeConfig) -> RunnerResult<bool> {
        self.record_call(CapturedCall::from_config("is_available", config));
        Ok(*self.available.read())
    }

    async fn invoke(&self, config: &ComposeConfig) -> RunnerResult<InvocationReport> {
        self.record_call(CapturedCall::from_config("invoke", config));

        if let Some(program) = self.simulate_spawn_failure.read().clone() {
            return Err(RunnerError::SpawnFailed {
                program,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "mock: not found"),
            });
        }

        let response = self.next_response();
        if let Some(handler) = &self.log_handler {
            let stream = if config.stream.forwards_stderr() {
                LogStream::Stderr
            } else {
                LogStream::Stdout
            };
            for message in &response.lines {
                handler(LogLine {
                    timestamp: Utc::now(),
                    stream,
                    message: message.clone(),
                });
            }
        }

        let started_at = Utc::now();
        let finished_at = started_at + chrono::Duration::milliseconds(response.duration_ms as i64);

        Ok(InvocationReport {
            run_id: Uuid::new_v4(),
            command: config.command_line(),
            lines_forwarded: response.lines.len(),
            exit_code: response.exit_code,
            dry_run: false,
            started_at,
            finished_at,
            duration_ms: response.duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_runner_basic() {
        let runner = MockComposeRunner::new()
            .add_response(MockResponse::success(["Creating web_1", "done"]));

        let report = runner.invoke(&ComposeConfig::default()).await.unwrap();
        assert_eq!(report.lines_forwarded, 2);
        assert!(report.exited_cleanly());
    }

    #[tokio::test]
    async fn test_mock_runner_captures_calls() {
        let runner = MockComposeRunner::new();
        let config = ComposeConfig::default()
            .compose_file("stack/docker-compose.yml")
            .workdir("stack")
            .env("COMPOSE_PROJECT_NAME", "demo");

        runner.invoke(&config).await.unwrap();

        let calls = runner.get_calls();
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(call.method, "invoke");
        assert_eq!(call.program, "docker-compose");
        assert_eq!(call.args, vec!["-f", "stack/docker-compose.yml", "up"]);
        assert_eq!(call.workdir, Some(PathBuf::from("stack")));
        assert_eq!(call.env.get("COMPOSE_PROJECT_NAME").map(String::as_str), Some("demo"));
    }

    #[tokio::test]
    async fn test_mock_runner_spawn_failure() {
        let runner = MockComposeRunner::new().simulate_spawn_failure("docker-compose");

        let err = runner.invoke(&ComposeConfig::default()).await.unwrap_err();
        assert!(err.is_spawn_failure());
        assert_eq!(runner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_runner_cycles_responses() {
        let runner = MockComposeRunner::new().with_responses(vec![
            MockResponse::success(["first"]),
            MockResponse::exit(1),
        ]);
        let config = ComposeConfig::default();

        assert_eq!(runner.invoke(&config).await.unwrap().exit_code, Some(0));
        assert_eq!(runner.invoke(&config).await.unwrap().exit_code, Some(1));
        assert_eq!(runner.invoke(&config).await.unwrap().exit_code, Some(0));
    }

    #[tokio::test]
    async fn test_mock_runner_feeds_log_handler() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let handler: LogHandler = Arc::new({
            let seen = seen.clone();
            move |line: LogLine| seen.lock().push(line.message)
        });
        let runner = MockComposeRunner::new()
            .add_response(MockResponse::success(["pulling", "starting"]).with_duration(5))
            .with_log_handler(handler);

        let report = runner.invoke(&ComposeConfig::default()).await.unwrap();

        assert_eq!(*seen.lock(), vec!["pulling", "starting"]);
        assert_eq!(report.duration_ms, 5);
    }

    #[tokio::test]
    async fn test_mock_runner_availability() {
        let config = ComposeConfig::default();
        assert!(MockComposeRunner::new().is_available(&config).await.unwrap());
        assert!(!MockComposeRunner::new()
            .set_available(false)
            .is_available(&config)
            .await
            .unwrap());
    }
}
