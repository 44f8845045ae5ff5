//! Integration tests for the tool execution layer.
//!
//! These tests drive the runner through the public API, using the mock
//! runner where terraform or ansible would otherwise be required.

use std::sync::Arc;

use gantry_runner::{
    CommonTools, LogLine, MockResponse, MockRunner, ProcessRunner, ProcessRunnerOptions,
    RunConfig, RunnerError, ToolCommand, ToolRunner,
};
use parking_lot::Mutex;

/// Sequential responses are replayed in order for unmatched calls.
#[tokio::test]
async fn test_mock_runner_sequential_responses() {
    let runner = MockRunner::new().with_responses(vec![
        MockResponse::success("init done"),
        MockResponse::success("plan done"),
        MockResponse::failure(1, "apply failed"),
    ]);

    let run_config = RunConfig::default();
    let base = CommonTools::terraform("/work");

    let r1 = runner.run(&base.clone().arg("init"), &run_config).await.unwrap();
    assert!(r1.success());
    assert_eq!(r1.stdout, "init done");

    let r2 = runner.run(&base.clone().arg("plan"), &run_config).await.unwrap();
    assert_eq!(r2.stdout, "plan done");

    let r3 = runner.run(&base.clone().arg("apply"), &run_config).await.unwrap();
    assert!(!r3.success());
    assert_eq!(r3.error_text(), "apply failed");

    assert_eq!(
        runner.run_sequence(),
        vec!["terraform init", "terraform plan", "terraform apply"]
    );
}

/// A slow mock response really suspends the caller.
#[tokio::test]
async fn test_mock_runner_duration_is_observable() {
    let runner = MockRunner::new().on(
        "terraform",
        "apply",
        MockResponse::success("applied").with_duration(50),
    );

    let started = std::time::Instant::now();
    let cmd = ToolCommand::new("terraform").arg("apply");
    let result = runner.run(&cmd, &RunConfig::default()).await.unwrap();

    assert!(started.elapsed().as_millis() >= 50);
    assert_eq!(result.duration_ms, 50);
}

/// Simulated infrastructure failures surface as runner errors.
#[tokio::test]
async fn test_mock_runner_failure_simulation() {
    let runner = MockRunner::new().simulate_failure("simulated failure");

    let result = runner
        .run(&ToolCommand::new("terraform").arg("plan"), &RunConfig::default())
        .await;

    match result {
        Err(RunnerError::ExecutionFailed(msg)) => assert!(msg.contains("simulated")),
        other => panic!("Expected ExecutionFailed error, got {:?}", other),
    }
}

/// Call tracking and clearing.
#[tokio::test]
async fn test_call_tracking() {
    let runner = MockRunner::new();
    let run_config = RunConfig::default();

    let _ = runner.is_available("terraform").await;
    let _ = runner.run(&ToolCommand::new("terraform").arg("plan"), &run_config).await;
    let _ = runner.run(&ToolCommand::new("terraform").arg("plan"), &run_config).await;

    assert_eq!(runner.call_count(), 3);
    assert_eq!(runner.calls_to("terraform", "plan").len(), 2);

    runner.clear_calls();
    assert_eq!(runner.call_count(), 0);
}

/// Run config builder.
#[test]
fn test_run_config_builder() {
    let config = RunConfig::default().timeout(120).stream_logs(true);
    assert_eq!(config.timeout_seconds, 120);
    assert!(config.stream_logs);

    assert_eq!(RunConfig::default().no_timeout().timeout_seconds, 0);
}

/// The log handler sees every captured line.
#[cfg(unix)]
#[tokio::test]
async fn test_process_runner_log_handler() {
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();

    let runner = ProcessRunner::new(ProcessRunnerOptions::new()).with_log_handler(Arc::new(
        move |line: LogLine| sink.lock().push(format!("{}:{}", line.stream, line.message)),
    ));

    let dir = tempfile::tempdir().unwrap();
    let cmd = ToolCommand::new("sh")
        .args(["-c", "echo one; echo two"])
        .workdir(dir.path());
    let result = runner.run(&cmd, &RunConfig::default()).await.unwrap();

    assert!(result.success());
    assert_eq!(*seen.lock(), vec!["stdout:one", "stdout:two"]);
}

/// Environment from the command reaches the child process.
#[cfg(unix)]
#[tokio::test]
async fn test_process_runner_passes_env() {
    let runner = ProcessRunner::default();
    let cmd = ToolCommand::new("sh")
        .args(["-c", "printf %s \"$ANSIBLE_HOST_KEY_CHECKING\""])
        .env("ANSIBLE_HOST_KEY_CHECKING", "False");

    let result = runner.run(&cmd, &RunConfig::default()).await.unwrap();
    assert_eq!(result.stdout, "False\n");
}
