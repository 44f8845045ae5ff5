//! Process-based tool runner.
//!
//! Spawns external tools (terraform, ansible-playbook) as child processes,
//! captures their output and enforces a per-call timeout. Children are
//! killed when the owning future is dropped, so aborting the calling task
//! cancels the tool run.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::{RunConfig, ToolCommand};
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{ExecutionResult, ToolRunner};

/// Log output from a tool execution.
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

/// Process runner options.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunnerOptions {
    /// Dry-run mode (log commands without executing)
    pub dry_run: bool,
}

impl ProcessRunnerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

/// Runs tools as local child processes.
#[derive(Clone, Default)]
pub struct ProcessRunner {
    options: ProcessRunnerOptions,
    log_handler: Option<LogHandler>,
}

impl ProcessRunner {
    pub fn new(options: ProcessRunnerOptions) -> Self {
        Self {
            options,
            log_handler: None,
        }
    }

    /// Set a log handler for streamed output lines.
    pub fn with_log_handler(mut self, handler: LogHandler) -> Self {
        self.log_handler = Some(handler);
        self
    }

    /// Check if dry-run mode is enabled.
    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    fn build_command(&self, command: &ToolCommand) -> RunnerResult<Command> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .envs(&command.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &command.workdir {
            if !dir.is_dir() {
                return Err(RunnerError::MissingWorkdir(dir.display().to_string()));
            }
            cmd.current_dir(dir);
        }

        Ok(cmd)
    }

    fn collect<R>(&self, reader: R, stream: LogStream, run_config: &RunConfig) -> JoinHandle<String>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let stream_logs = run_config.stream_logs;
        let handler = self.log_handler.clone();

        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            let mut output = String::new();
            while let Ok(Some(line)) = lines.next_line().await {
                output.push_str(&line);
                output.push('\n');
                if stream_logs {
                    info!(%stream, "{}", line);
                }
                if let Some(handler) = &handler {
                    handler(LogLine {
                        timestamp: Utc::now(),
                        stream,
                        message: line,
                    });
                }
            }
            output
        })
    }

    async fn execute(
        &self,
        command: &ToolCommand,
        run_config: &RunConfig,
    ) -> RunnerResult<(i64, String, String)> {
        let mut child = self
            .build_command(command)?
            .spawn()
            .map_err(|e| RunnerError::SpawnFailed {
                program: command.program.clone(),
                message: e.to_string(),
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RunnerError::ExecutionFailed("stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RunnerError::ExecutionFailed("stderr was not captured".to_string()))?;

        let stdout_task = self.collect(stdout, LogStream::Stdout, run_config);
        let stderr_task = self.collect(stderr, LogStream::Stderr, run_config);

        let status = if run_config.timeout_seconds > 0 {
            let timeout = Duration::from_secs(run_config.timeout_seconds);
            match tokio::time::timeout(timeout, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    warn!(
                        "{} exceeded {}s, killing process",
                        command.program, run_config.timeout_seconds
                    );
                    let _ = child.kill().await;
                    return Err(RunnerError::Timeout {
                        program: command.program.clone(),
                        seconds: run_config.timeout_seconds,
                    });
                }
            }
        } else {
            child.wait().await?
        };

        let stdout_output = stdout_task.await.unwrap_or_default();
        let stderr_output = stderr_task.await.unwrap_or_default();

        Ok((status.code().unwrap_or(-1) as i64, stdout_output, stderr_output))
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn is_available(&self, program: &str) -> RunnerResult<bool> {
        let status = Command::new(program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        Ok(status.map(|s| s.success()).unwrap_or(false))
    }

    async fn run(
        &self,
        command: &ToolCommand,
        run_config: &RunConfig,
    ) -> RunnerResult<ExecutionResult> {
        let cmd_str = command.display();
        debug!("Command: {}", cmd_str);

        if self.options.dry_run {
            info!("[DRY-RUN] Would execute: {}", cmd_str);
            let now = Utc::now();
            return Ok(ExecutionResult {
                execution_id: "dry-run".to_string(),
                program: command.program.clone(),
                exit_code: 0,
                stdout: format!("[DRY-RUN] Command: {}", cmd_str),
                stderr: String::new(),
                started_at: now,
                finished_at: now,
                duration_ms: 0,
            });
        }

        let started_at = Utc::now();
        let (exit_code, stdout, stderr) = self.execute(command, run_config).await?;
        let finished_at = Utc::now();
        let duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;

        if exit_code == 0 {
            info!("{} completed in {}ms", command.program, duration_ms);
        } else {
            error!(
                "{} exited with code {} after {}ms",
                command.program, exit_code, duration_ms
            );
        }

        Ok(ExecutionResult {
            execution_id: uuid::Uuid::new_v4().to_string(),
            program: command.program.clone(),
            exit_code,
            stdout,
            stderr,
            started_at,
            finished_at,
            duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_does_not_spawn() {
        let runner = ProcessRunner::new(ProcessRunnerOptions::new().dry_run());
        assert!(runner.is_dry_run());

        let cmd = ToolCommand::new("definitely-not-a-real-binary").arg("plan");
        let result = runner.run(&cmd, &RunConfig::default()).await.unwrap();

        assert!(result.success());
        assert!(result.stdout.contains("definitely-not-a-real-binary plan"));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let runner = ProcessRunner::default();
        let cmd = ToolCommand::new("definitely-not-a-real-binary");

        let err = runner.run(&cmd, &RunConfig::default()).await.unwrap_err();
        assert!(matches!(err, RunnerError::SpawnFailed { .. }));
    }

    #[tokio::test]
    async fn test_missing_workdir_is_rejected() {
        let runner = ProcessRunner::default();
        let cmd = ToolCommand::new("terraform").workdir("/nonexistent/gantry/workspace");

        let err = runner.run(&cmd, &RunConfig::default()).await.unwrap_err();
        assert!(matches!(err, RunnerError::MissingWorkdir(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_output_and_exit_code() {
        let runner = ProcessRunner::default();
        let cmd = ToolCommand::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]);

        let result = runner.run(&cmd, &RunConfig::default()).await.unwrap();
        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stdout, "out\n");
        assert_eq!(result.stderr, "err\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_process() {
        let runner = ProcessRunner::default();
        let cmd = ToolCommand::new("sh").args(["-c", "sleep 5"]);

        let err = runner
            .run(&cmd, &RunConfig::default().timeout(1))
            .await
            .unwrap_err();
        assert!(matches!(err, RunnerError::Timeout { seconds: 1, .. }));
    }
}
