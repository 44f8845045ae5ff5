//! Tool runner trait and types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{RunConfig, ToolCommand};
use crate::error::RunnerResult;

/// Result of an external tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Unique id for log correlation
    pub execution_id: String,
    /// Program that was executed
    pub program: String,
    /// Exit code from the process (-1 if killed by a signal)
    pub exit_code: i64,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
    /// Execution start time
    pub started_at: DateTime<Utc>,
    /// Execution end time
    pub finished_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Check if execution was successful (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get combined output (stdout + stderr).
    pub fn combined_output(&self) -> String {
        if self.stdout.is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }

    /// Stderr if present, otherwise stdout. Tools do not agree on where
    /// they print diagnostics.
    pub fn error_text(&self) -> String {
        if self.stderr.trim().is_empty() {
            self.stdout.trim().to_string()
        } else {
            self.stderr.trim().to_string()
        }
    }
}

/// Executes external tools.
///
/// A non-zero exit is not an error at this layer: callers decide what an
/// exit code means (`terraform plan -detailed-exitcode` returns 2 on drift).
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Check whether a program can be executed.
    async fn is_available(&self, program: &str) -> RunnerResult<bool>;

    /// Run a command to completion and capture its output.
    async fn run(&self, command: &ToolCommand, run_config: &RunConfig)
        -> RunnerResult<ExecutionResult>;
}
