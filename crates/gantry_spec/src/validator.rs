//! Provisioning request validation.

use regex::Regex;

use crate::error::{SpecError, SpecResult};
use crate::models::ProvisioningRequest;

/// Validation result with details.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Convert into an error if any check failed.
    pub fn into_result(self) -> SpecResult<Vec<String>> {
        if self.valid {
            Ok(self.warnings)
        } else {
            Err(SpecError::ValidationFailed(self.errors.join("; ")))
        }
    }
}

/// Validator for provisioning requests.
pub struct RequestValidator {
    memory_size: Regex,
    version: Regex,
    identifier: Regex,
}

impl Default for RequestValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestValidator {
    pub fn new() -> Self {
        Self {
            // PostgreSQL memory units, e.g. 128MB, 1GB, 8192kB
            memory_size: Regex::new(r"^[1-9][0-9]*(kB|MB|GB|TB)$").unwrap(),
            version: Regex::new(r"^[0-9]+(\.[0-9]+)?$").unwrap(),
            identifier: Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap(),
        }
    }

    /// Validate every field of a request.
    pub fn validate(&self, request: &ProvisioningRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        Self::require_non_empty(&mut result, "instance_type", &request.instance_type);
        Self::require_non_empty(&mut result, "aws_region", &request.aws_region);
        Self::require_non_empty(&mut result, "ssh_key_name", &request.ssh_key_name);

        if request.num_replicas == 0 {
            result.add_error("num_replicas must be at least 1");
        } else if request.num_replicas > 5 {
            result.add_warning(format!(
                "num_replicas={} is unusually high for a single primary",
                request.num_replicas
            ));
        }

        if !request.subnet_id.starts_with("subnet-") {
            result.add_error(format!(
                "subnet_id '{}' must start with 'subnet-'",
                request.subnet_id
            ));
        }

        if !self.version.is_match(&request.postgres_version) {
            result.add_error(format!(
                "postgres_version '{}' must be numeric (e.g. 16 or 15.4)",
                request.postgres_version
            ));
        }

        if request.max_connections == 0 {
            result.add_error("max_connections must be at least 1");
        } else if request.max_connections > 5000 {
            result.add_warning(format!(
                "max_connections={} will need a connection pooler",
                request.max_connections
            ));
        }

        if !self.memory_size.is_match(&request.shared_buffers) {
            result.add_error(format!(
                "shared_buffers '{}' must be a size like 128MB or 1GB",
                request.shared_buffers
            ));
        }

        if !self.identifier.is_match(&request.replication_user) {
            result.add_error(format!(
                "replication_user '{}' is not a valid PostgreSQL role name",
                request.replication_user
            ));
        }

        result
    }

    /// Validate and fail on the first set of errors.
    pub fn ensure_valid(&self, request: &ProvisioningRequest) -> SpecResult<Vec<String>> {
        self.validate(request).into_result()
    }

    fn require_non_empty(result: &mut ValidationResult, field: &str, value: &str) {
        if value.trim().is_empty() {
            result.add_error(format!("{} cannot be empty", field));
        }
    }
}
