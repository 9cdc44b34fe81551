//! Integration tests for the compose invocation layer.
//!
//! These tests stand in `sh` for the compose tool so the streaming and
//! process lifecycle can be checked without docker installed.

#![cfg(unix)]

use std::sync::Arc;

use parking_lot::Mutex;
use stackup_runner::{
    CliComposeRunner, CliRunnerOptions, ComposeConfig, ComposeRunner, LogHandler, LogLine,
    LogStream, RunnerError, StreamSelection,
};
use tempfile::tempdir;

/// Runner that records forwarded lines instead of printing them.
fn recording_runner() -> (CliComposeRunner, Arc<Mutex<Vec<LogLine>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let handler: LogHandler = Arc::new({
        let seen = seen.clone();
        move |line: LogLine| seen.lock().push(line)
    });
    let runner = CliComposeRunner::new(CliRunnerOptions::new().ci_mode(false).silent())
        .with_log_handler(handler);
    (runner, seen)
}

fn shell(script: &str) -> ComposeConfig {
    ComposeConfig::new("sh").args(vec!["-c".to_string(), script.to_string()])
}

fn messages(lines: &[LogLine]) -> Vec<&str> {
    lines.iter().map(|l| l.message.as_str()).collect()
}

#[tokio::test]
async fn test_missing_program_is_spawn_error() {
    let (runner, seen) = recording_runner();
    let config = ComposeConfig::new("stackup-test-no-such-compose-binary");

    let err = runner.invoke(&config).await.unwrap_err();

    match &err {
        RunnerError::SpawnFailed { program, .. } => {
            assert_eq!(program, "stackup-test-no-such-compose-binary")
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_spawn_failure());
    assert!(seen.lock().is_empty());
}

#[tokio::test]
async fn test_forwards_stderr_lines_in_order() {
    let (runner, seen) = recording_runner();
    let config = shell("for i in 1 2 3 4 5; do echo \"step $i\" >&2; done");

    let report = runner.invoke(&config).await.unwrap();

    assert_eq!(report.lines_forwarded, 5);
    assert_eq!(report.exit_code, Some(0));
    let seen = seen.lock();
    assert_eq!(
        messages(&seen),
        vec!["step 1", "step 2", "step 3", "step 4", "step 5"]
    );
    assert!(seen.iter().all(|l| l.stream == LogStream::Stderr));
}

#[tokio::test]
async fn test_stdout_not_forwarded_by_default() {
    let (runner, seen) = recording_runner();
    let config = shell("echo to-stdout; echo to-stderr >&2");

    let report = runner.invoke(&config).await.unwrap();

    assert_eq!(report.lines_forwarded, 1);
    assert_eq!(messages(&seen.lock()), vec!["to-stderr"]);
}

#[tokio::test]
async fn test_forwards_stdout_when_selected() {
    let (runner, seen) = recording_runner();
    let config = shell("echo a; echo b; echo ignored >&2").stream(StreamSelection::Stdout);

    let report = runner.invoke(&config).await.unwrap();

    assert_eq!(report.lines_forwarded, 2);
    let seen = seen.lock();
    assert_eq!(messages(&seen), vec!["a", "b"]);
    assert!(seen.iter().all(|l| l.stream == LogStream::Stdout));
}

#[tokio::test]
async fn test_forwards_both_streams() {
    let (runner, seen) = recording_runner();
    let config = shell("echo out1; echo err1 >&2; echo out2; echo err2 >&2")
        .stream(StreamSelection::Both);

    let report = runner.invoke(&config).await.unwrap();

    assert_eq!(report.lines_forwarded, 4);
    let seen = seen.lock();
    let stdout: Vec<_> = seen
        .iter()
        .filter(|l| l.stream == LogStream::Stdout)
        .map(|l| l.message.as_str())
        .collect();
    let stderr: Vec<_> = seen
        .iter()
        .filter(|l| l.stream == LogStream::Stderr)
        .map(|l| l.message.as_str())
        .collect();
    assert_eq!(stdout, vec!["out1", "out2"]);
    assert_eq!(stderr, vec!["err1", "err2"]);
}

#[tokio::test]
async fn test_nonzero_exit_is_not_an_error() {
    let (runner, seen) = recording_runner();
    let config = shell("echo 'service failed' >&2; exit 3");

    let report = runner.invoke(&config).await.unwrap();

    assert_eq!(report.exit_code, Some(3));
    assert!(!report.exited_cleanly());
    assert_eq!(messages(&seen.lock()), vec!["service failed"]);
}

#[tokio::test]
async fn test_silent_child_forwards_nothing() {
    let (runner, seen) = recording_runner();

    let report = runner.invoke(&shell("true")).await.unwrap();

    assert_eq!(report.lines_forwarded, 0);
    assert!(seen.lock().is_empty());
}

#[tokio::test]
async fn test_workdir_and_env_reach_child() {
    let temp = tempdir().unwrap();
    std::fs::write(temp.path().join("marker.txt"), "from-workdir\n").unwrap();

    let (runner, seen) = recording_runner();
    let config = shell("cat marker.txt >&2; echo \"$STACKUP_TEST_VALUE\" >&2")
        .workdir(temp.path())
        .env("STACKUP_TEST_VALUE", "from-env");

    runner.invoke(&config).await.unwrap();

    assert_eq!(messages(&seen.lock()), vec!["from-workdir", "from-env"]);
}

#[tokio::test]
async fn test_dry_run_reports_command() {
    let runner = CliComposeRunner::new(CliRunnerOptions::new().dry_run().silent());
    let config = ComposeConfig::default().compose_file("docker-compose.yml");

    let report = runner.invoke(&config).await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.command, "docker-compose -f docker-compose.yml up");
    assert_eq!(report.exit_code, None);
}

#[tokio::test]
async fn test_is_available() {
    let runner = CliComposeRunner::default();
    assert!(!runner
        .is_available(&ComposeConfig::new("stackup-test-no-such-compose-binary"))
        .await
        .unwrap());
    assert!(runner
        .is_available(&ComposeConfig::new("true"))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_stdout_reader_panic_still_waits_for_child() {
    let temp = tempdir().unwrap();
    let marker = temp.path().join("exited");

    let handler: LogHandler = Arc::new(|line: LogLine| {
        if line.stream == LogStream::Stdout {
            panic!("handler rejected {}", line.message);
        }
    });
    let runner =
        CliComposeRunner::new(CliRunnerOptions::new().silent()).with_log_handler(handler);
    let config = shell(&format!(
        "echo out; exec 2>&-; sleep 0.3; touch '{}'",
        marker.display()
    ))
    .stream(StreamSelection::Both);

    let err = runner.invoke(&config).await.unwrap_err();
    assert!(matches!(err, RunnerError::Join(_)));
    assert!(marker.exists(), "child was not waited on");
}
