//! Compose runner trait and types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ComposeConfig;
use crate::error::RunnerResult;

/// Lifecycle of the child process within one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationState {
    Created,
    Streaming,
    Exited,
}

impl InvocationState {
    /// The only state reachable from this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Created => Some(Self::Streaming),
            Self::Streaming => Some(Self::Exited),
            Self::Exited => None,
        }
    }

    /// Move to the next state. `Exited` stays `Exited`.
    pub fn advance(&mut self) -> Self {
        if let Some(next) = self.next() {
            *self = next;
        }
        *self
    }
}

/// Result of a compose invocation.
///
/// The exit code is recorded for reporting only; a non-zero exit is not an
/// error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationReport {
    /// Correlation id of this invocation
    pub run_id: Uuid,
    /// Command line that was (or would have been) executed
    pub command: String,
    /// Number of lines forwarded to the console
    pub lines_forwarded: usize,
    /// Exit code, `None` if killed by a signal or not run
    pub exit_code: Option<i32>,
    /// Whether the command was only printed
    pub dry_run: bool,
    /// Execution start time
    pub started_at: DateTime<Utc>,
    /// Execution end time
    pub finished_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl InvocationReport {
    /// Report for a command that was not executed.
    pub fn dry_run(run_id: Uuid, command: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            command: command.into(),
            lines_forwarded: 0,
            exit_code: None,
            dry_run: true,
            started_at: now,
            finished_at: now,
            duration_ms: 0,
        }
    }

    /// Whether the child exited with code 0.
    pub fn exited_cleanly(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Compose runner trait.
#[async_trait]
pub trait ComposeRunner: Send + Sync {
    /// Check if the configured compose program can be started.
    async fn is_available(&self, config: &ComposeConfig) -> RunnerResult<bool>;

    /// Run the compose command, forwarding its output until it exits.
    async fn invoke(&self, config: &ComposeConfig) -> RunnerResult<InvocationReport>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_moves_forward_only() {
        let mut state = InvocationState::Created;
        assert_eq!(state.advance(), InvocationState::Streaming);
        assert_eq!(state.advance(), InvocationState::Exited);
        assert_eq!(state.advance(), InvocationState::Exited);
        assert_eq!(InvocationState::Exited.next(), None);
    }

    #[test]
    fn test_dry_run_report() {
        let report = InvocationReport::dry_run(Uuid::new_v4(), "docker-compose up");
        assert!(report.dry_run);
        assert_eq!(report.lines_forwarded, 0);
        assert!(!report.exited_cleanly());
    }

    #[test]
    fn test_report_serializes() {
        let report = InvocationReport::dry_run(Uuid::nil(), "docker-compose up");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["command"], "docker-compose up");
        assert_eq!(json["exit_code"], serde_json::Value::Null);
    }
}
