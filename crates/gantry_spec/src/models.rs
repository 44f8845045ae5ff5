//! Data models for provisioning requests.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SpecError, SpecResult};

/// Region used when a request does not name one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Minimum length accepted for the replication password.
pub const MIN_SECRET_LEN: usize = 12;

/// A secret string that never prints its value.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the raw value. Only renderers should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reject secrets shorter than `min` characters.
    pub fn ensure_min_len(&self, name: &str, min: usize) -> SpecResult<()> {
        if self.0.chars().count() < min {
            return Err(SpecError::WeakSecret {
                name: name.to_string(),
                min,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(********)")
    }
}

impl Serialize for Secret {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("********")
    }
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

/// Desired state of a PostgreSQL primary with streaming replicas.
///
/// Immutable once submitted for a generation cycle. The replication
/// password may be omitted here and supplied by controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvisioningRequest {
    pub instance_type: String,
    pub num_replicas: u32,
    #[serde(default = "default_region")]
    pub aws_region: String,
    pub ssh_key_name: String,
    pub subnet_id: String,
    pub postgres_version: String,
    pub max_connections: u32,
    pub shared_buffers: String,
    pub replication_user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_password: Option<Secret>,
}

impl ProvisioningRequest {
    /// Parse a request from YAML text.
    pub fn from_yaml_str(content: &str) -> SpecResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parse a request from JSON text.
    pub fn from_json_str(content: &str) -> SpecResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a request file, picking the format from its extension.
    pub fn from_file(path: &Path) -> SpecResult<Self> {
        if !path.exists() {
            return Err(SpecError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(SpecError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Pick the replication password from the request, falling back to the
    /// configured one. There is no built-in default.
    pub fn resolve_replication_password(&self, fallback: Option<&Secret>) -> SpecResult<Secret> {
        let secret = self
            .replication_password
            .as_ref()
            .filter(|s| !s.is_empty())
            .or(fallback.filter(|s| !s.is_empty()))
            .cloned()
            .ok_or_else(|| SpecError::MissingField("replication_password".to_string()))?;

        secret.ensure_min_len("replication_password", MIN_SECRET_LEN)?;
        Ok(secret)
    }

    /// Flatten the request into template variables. Secrets are not
    /// included; the generator adds them after resolution.
    pub fn variables(&self) -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();
        vars.insert("instance_type".to_string(), self.instance_type.clone());
        vars.insert("num_replicas".to_string(), self.num_replicas.to_string());
        vars.insert("aws_region".to_string(), self.aws_region.clone());
        vars.insert("ssh_key_name".to_string(), self.ssh_key_name.clone());
        vars.insert("subnet_id".to_string(), self.subnet_id.clone());
        vars.insert("postgres_version".to_string(), self.postgres_version.clone());
        vars.insert("max_connections".to_string(), self.max_connections.to_string());
        vars.insert("shared_buffers".to_string(), self.shared_buffers.clone());
        vars.insert("replication_user".to_string(), self.replication_user.clone());
        vars
    }
}
