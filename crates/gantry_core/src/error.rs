//! Error types for the core module.

use thiserror::Error;

use gantry_iac::IacError;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur during controller operations.
///
/// Apply failures never appear here: they are recorded in the session's
/// [`crate::ApplyOutcome`] and read back through status queries.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid provisioning request: {0}")]
    InvalidRequest(#[from] gantry_spec::SpecError),

    #[error("Artifact generation failed: {0}")]
    Generation(#[from] gantry_templates::TemplateError),

    #[error("Plan failed: {0}")]
    Plan(#[source] IacError),

    #[error("Drift check failed: {0}")]
    DriftCheck(#[source] IacError),

    #[error("Invalid settings: {0}")]
    Settings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CoreError {
    /// Whether the caller supplied bad input rather than the system failing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, CoreError::InvalidRequest(_))
    }
}
