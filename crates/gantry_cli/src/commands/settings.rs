//! Settings flags shared by the commands that touch a workspace.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use gantry_core::{ApplyController, ControllerSettings};
use gantry_iac::TerraformExecutor;
use gantry_runner::{ProcessRunner, ProcessRunnerOptions};
use gantry_spec::Secret;
use gantry_templates::TemplateGenerator;

#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Settings file (YAML)
    #[arg(short, long, env = "GANTRY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Terraform workspace directory
    #[arg(long, env = "GANTRY_TERRAFORM_DIR")]
    pub terraform_dir: Option<PathBuf>,

    /// Ansible directory
    #[arg(long, env = "GANTRY_ANSIBLE_DIR")]
    pub ansible_dir: Option<PathBuf>,

    /// Template root containing terraform/ and ansible/
    #[arg(long, env = "GANTRY_TEMPLATE_DIR")]
    pub template_dir: Option<PathBuf>,

    /// SSH private key used by ansible
    #[arg(long, env = "GANTRY_SSH_PRIVATE_KEY")]
    pub ssh_key: Option<PathBuf>,

    /// SSH user used by ansible
    #[arg(long, env = "GANTRY_SSH_USER")]
    pub ssh_user: Option<String>,

    /// Seconds to wait for instances to boot before configuring
    #[arg(long, env = "GANTRY_SETTLE_DELAY_SECS")]
    pub settle_delay: Option<u64>,

    /// Timeout for each terraform or ansible run, in seconds
    #[arg(long, env = "GANTRY_TOOL_TIMEOUT_SECS")]
    pub tool_timeout: Option<u64>,

    /// Replication password used when a request omits it
    #[arg(long, env = "GANTRY_REPLICATION_PASSWORD", hide_env_values = true)]
    pub replication_password: Option<String>,

    /// Log tool commands instead of running them
    #[arg(long)]
    pub dry_run: bool,
}

impl SettingsArgs {
    /// Merge the settings file with flag and environment overrides.
    pub fn resolve(&self) -> Result<ControllerSettings> {
        let mut settings = match &self.config {
            Some(path) => ControllerSettings::from_yaml_file(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => ControllerSettings::default(),
        };

        if let Some(dir) = &self.terraform_dir {
            settings.terraform_dir = dir.clone();
        }
        if let Some(dir) = &self.ansible_dir {
            settings.ansible_dir = dir.clone();
        }
        if let Some(dir) = &self.template_dir {
            settings.template_dir = dir.clone();
        }
        if let Some(key) = &self.ssh_key {
            settings.ssh_private_key = Some(key.clone());
        }
        if let Some(user) = &self.ssh_user {
            settings.ssh_user = user.clone();
        }
        if let Some(delay) = self.settle_delay {
            settings.settle_delay_secs = delay;
        }
        if let Some(timeout) = self.tool_timeout {
            settings.tool_timeout_secs = timeout;
        }
        if let Some(password) = &self.replication_password {
            settings.replication_password = Some(Secret::new(password.clone()));
        }

        debug!("Resolved settings: {:?}", settings);
        Ok(settings)
    }

    /// Build a controller wired to the real tools.
    pub fn controller(&self) -> Result<ApplyController> {
        let settings = self.resolve()?;
        let mut options = ProcessRunnerOptions::new();
        if self.dry_run {
            options = options.dry_run();
        }
        let runner = Arc::new(ProcessRunner::new(options));
        let executor = TerraformExecutor::new(runner, settings.ansible_dir.clone())
            .with_timeout(settings.tool_timeout_secs);
        let generator = TemplateGenerator::new(settings.template_dir.clone());

        Ok(ApplyController::new(
            settings,
            Arc::new(executor),
            Arc::new(generator),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("gantry.yaml");
        std::fs::write(
            &config,
            "terraform_dir: /srv/tf\nssh_user: admin\nsettle_delay_secs: 5\n",
        )
        .unwrap();

        let args = SettingsArgs {
            config: Some(config),
            ssh_user: Some("ubuntu".to_string()),
            replication_password: Some("flag-replication-pw".to_string()),
            ..Default::default()
        };
        let settings = args.resolve().unwrap();

        assert_eq!(settings.terraform_dir, PathBuf::from("/srv/tf"));
        assert_eq!(settings.ssh_user, "ubuntu");
        assert_eq!(settings.settle_delay_secs, 5);
        assert_eq!(
            settings.replication_password.as_ref().map(Secret::expose),
            Some("flag-replication-pw")
        );
    }

    #[test]
    fn test_controller_requires_ssh_key() {
        let err = SettingsArgs::default().controller().err().unwrap();
        assert!(err.to_string().contains("ssh_private_key"));
    }
}
