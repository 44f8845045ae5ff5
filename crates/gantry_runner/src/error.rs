//! Error types for the runner module.

use thiserror::Error;

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that can occur during runner operations.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Tool not available: {0}")]
    ToolNotAvailable(String),

    #[error("Failed to spawn {program}: {message}")]
    SpawnFailed { program: String, message: String },

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("{program} timed out after {seconds} seconds")]
    Timeout { program: String, seconds: u64 },

    #[error("Working directory does not exist: {0}")]
    MissingWorkdir(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
