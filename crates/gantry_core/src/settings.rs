//! Controller settings.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use gantry_iac::SshSettings;
use gantry_spec::{Secret, MIN_SECRET_LEN};

use crate::error::{CoreError, CoreResult};

fn default_terraform_dir() -> PathBuf {
    PathBuf::from("workspace/terraform")
}

fn default_ansible_dir() -> PathBuf {
    PathBuf::from("workspace/ansible")
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_ssh_user() -> String {
    "ubuntu".to_string()
}

fn default_settle_delay() -> u64 {
    30
}

fn default_tool_timeout() -> u64 {
    1800
}

/// Everything an [`crate::ApplyController`] needs to know about its workspace.
///
/// Paths and secrets have no built-in values beyond directory defaults: the
/// SSH key must be supplied, and the replication password must come from
/// here or from each request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerSettings {
    #[serde(default = "default_terraform_dir")]
    pub terraform_dir: PathBuf,
    #[serde(default = "default_ansible_dir")]
    pub ansible_dir: PathBuf,
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,
    #[serde(default = "default_ssh_user")]
    pub ssh_user: String,
    #[serde(default)]
    pub ssh_private_key: Option<PathBuf>,
    /// Seconds to wait after apply before configuring, so instances can boot.
    #[serde(default = "default_settle_delay")]
    pub settle_delay_secs: u64,
    /// Upper bound for each terraform or ansible invocation. 0 disables it.
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_password: Option<Secret>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            terraform_dir: default_terraform_dir(),
            ansible_dir: default_ansible_dir(),
            template_dir: default_template_dir(),
            ssh_user: default_ssh_user(),
            ssh_private_key: None,
            settle_delay_secs: default_settle_delay(),
            tool_timeout_secs: default_tool_timeout(),
            replication_password: None,
        }
    }
}

impl ControllerSettings {
    /// Load settings from a YAML file.
    pub fn from_yaml_file(path: &Path) -> CoreResult<Self> {
        let content = fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| CoreError::Serialization(format!("{}: {}", path.display(), e)))
    }

    pub fn with_workspace(
        mut self,
        terraform_dir: impl Into<PathBuf>,
        ansible_dir: impl Into<PathBuf>,
    ) -> Self {
        self.terraform_dir = terraform_dir.into();
        self.ansible_dir = ansible_dir.into();
        self
    }

    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = dir.into();
        self
    }

    pub fn with_ssh_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.ssh_private_key = Some(path.into());
        self
    }

    pub fn with_settle_delay(mut self, seconds: u64) -> Self {
        self.settle_delay_secs = seconds;
        self
    }

    pub fn with_replication_password(mut self, secret: Secret) -> Self {
        self.replication_password = Some(secret);
        self
    }

    /// Check the settings before a controller is built from them.
    pub fn validate(&self) -> CoreResult<()> {
        if self.ssh_user.trim().is_empty() {
            return Err(CoreError::Settings("ssh_user cannot be empty".to_string()));
        }
        self.ssh_settings()?
            .ensure_key_exists()
            .map_err(|e| CoreError::Settings(e.to_string()))?;
        if let Some(secret) = &self.replication_password {
            secret
                .ensure_min_len("replication_password", MIN_SECRET_LEN)
                .map_err(|e| CoreError::Settings(e.to_string()))?;
        }
        if self.terraform_dir == self.ansible_dir {
            return Err(CoreError::Settings(
                "terraform_dir and ansible_dir must differ".to_string(),
            ));
        }
        Ok(())
    }

    /// SSH access for the configuration run.
    pub fn ssh_settings(&self) -> CoreResult<SshSettings> {
        let key = self.ssh_private_key.clone().ok_or_else(|| {
            CoreError::Settings("ssh_private_key is required".to_string())
        })?;
        Ok(SshSettings::new(self.ssh_user.clone(), key))
    }
}
