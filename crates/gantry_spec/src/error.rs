//! Error types for request parsing and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for spec operations.
pub type SpecResult<T> = Result<T, SpecError>;

/// Errors that can occur while reading or validating a provisioning request.
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("Request file not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported request format for {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(PathBuf),

    #[error("Request validation failed: {0}")]
    ValidationFailed(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Secret {name} is too short (minimum {min} characters)")]
    WeakSecret { name: String, min: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}
