//! Error types for IaC module.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for IaC operations.
pub type IacResult<T> = Result<T, IacError>;

/// Errors that can occur while driving terraform or ansible.
#[derive(Error, Debug)]
pub enum IacError {
    #[error("Workspace directory not found: {0}")]
    WorkspaceMissing(PathBuf),

    #[error("No plan artifact at {0}; run a plan before applying")]
    PlanMissing(PathBuf),

    #[error("Playbook not found: {0}")]
    PlaybookMissing(PathBuf),

    #[error("SSH private key not found: {0}")]
    SshKeyMissing(PathBuf),

    #[error("{tool} failed with exit code {exit_code}: {stderr}")]
    Execution {
        tool: String,
        exit_code: i64,
        stderr: String,
    },

    #[error("Failed to parse {context} output: {source}")]
    OutputParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Terraform output {0} is missing")]
    MissingOutput(String),

    #[error("Terraform output {name} is invalid: {message}")]
    InvalidOutput { name: String, message: String },

    #[error("Runner error: {0}")]
    Runner(#[from] gantry_runner::RunnerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IacError {
    /// Short machine-readable category, used in plan and status payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            IacError::WorkspaceMissing(_) => "workspace-missing",
            IacError::PlanMissing(_) => "plan-missing",
            IacError::PlaybookMissing(_) | IacError::SshKeyMissing(_) => "configuration-missing",
            IacError::Execution { .. } => "tool-failed",
            IacError::OutputParse { .. } => "parse-failed",
            IacError::MissingOutput(_) | IacError::InvalidOutput { .. } => "output-invalid",
            IacError::Runner(gantry_runner::RunnerError::Timeout { .. }) => "timeout",
            IacError::Runner(_) => "tool-failed",
            IacError::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            IacError::WorkspaceMissing(PathBuf::from("/x")).kind(),
            "workspace-missing"
        );
        assert_eq!(
            IacError::Runner(gantry_runner::RunnerError::Timeout {
                program: "terraform".to_string(),
                seconds: 5
            })
            .kind(),
            "timeout"
        );
        let err = IacError::Execution {
            tool: "terraform apply".to_string(),
            exit_code: 1,
            stderr: "Error: quota exceeded".to_string(),
        };
        assert_eq!(err.kind(), "tool-failed");
        assert_eq!(
            err.to_string(),
            "terraform apply failed with exit code 1: Error: quota exceeded"
        );
    }
}
