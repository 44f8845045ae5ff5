//! Ansible playbook runner.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use gantry_runner::{CommonTools, RunConfig, ToolRunner};

use crate::error::{IacError, IacResult};
use crate::inventory::{Inventory, INVENTORY_FILE};

/// Playbook file name inside the ansible directory.
pub const PLAYBOOK_FILE: &str = "playbook.yml";

/// Runs the configuration playbook against an inventory.
pub struct AnsibleRunner {
    runner: Arc<dyn ToolRunner>,
    ansible_dir: PathBuf,
    run_config: RunConfig,
}

impl AnsibleRunner {
    pub fn new(runner: Arc<dyn ToolRunner>, ansible_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            ansible_dir: ansible_dir.into(),
            run_config: RunConfig::default(),
        }
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.run_config = self.run_config.timeout(seconds);
        self
    }

    pub fn ansible_dir(&self) -> &Path {
        &self.ansible_dir
    }

    /// Write the inventory and run the playbook. Returns the run log.
    pub async fn run_playbook(&self, inventory: &Inventory) -> IacResult<String> {
        let playbook = self.ansible_dir.join(PLAYBOOK_FILE);
        if !playbook.is_file() {
            return Err(IacError::PlaybookMissing(playbook));
        }
        inventory.write_to(&self.ansible_dir)?;

        info!(
            "Running {} against {} hosts",
            PLAYBOOK_FILE,
            inventory.nodes.all().count()
        );
        let command = CommonTools::ansible_playbook(&self.ansible_dir).args([
            "-i",
            INVENTORY_FILE,
            PLAYBOOK_FILE,
        ]);
        let result = self.runner.run(&command, &self.run_config).await?;

        if !result.success() {
            return Err(IacError::Execution {
                tool: CommonTools::ANSIBLE_PLAYBOOK.to_string(),
                exit_code: result.exit_code,
                stderr: result.error_text(),
            });
        }
        Ok(result.combined_output())
    }
}
