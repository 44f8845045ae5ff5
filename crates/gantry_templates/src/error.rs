//! Error types for templates.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while rendering artifacts.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(PathBuf),

    #[error("Template {template} references undefined variables: {}", .variables.join(", "))]
    MissingVariable {
        template: String,
        variables: Vec<String>,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
