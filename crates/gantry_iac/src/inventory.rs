//! Ansible inventory rendering.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IacError, IacResult};
use crate::outputs::NodeAddresses;

/// File name of the rendered inventory inside the ansible directory.
pub const INVENTORY_FILE: &str = "inventory.ini";

/// How ansible reaches the nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshSettings {
    pub user: String,
    pub private_key: PathBuf,
}

impl SshSettings {
    pub fn new(user: impl Into<String>, private_key: impl Into<PathBuf>) -> Self {
        Self {
            user: user.into(),
            private_key: private_key.into(),
        }
    }

    /// Fail if the private key file is not present.
    pub fn ensure_key_exists(&self) -> IacResult<()> {
        if !self.private_key.is_file() {
            return Err(IacError::SshKeyMissing(self.private_key.clone()));
        }
        Ok(())
    }
}

/// The hosts handed to the configuration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub nodes: NodeAddresses,
    pub ssh: SshSettings,
}

impl Inventory {
    pub fn new(nodes: NodeAddresses, ssh: SshSettings) -> Self {
        Self { nodes, ssh }
    }

    fn host_line(&self, address: &str) -> String {
        format!(
            "{} ansible_user={} ansible_ssh_private_key_file={}",
            address,
            self.ssh.user,
            self.ssh.private_key.display()
        )
    }

    /// Render INI text with `[primary]` and `[replica]` groups.
    pub fn render(&self) -> String {
        let mut out = String::from("[primary]\n");
        out.push_str(&self.host_line(&self.nodes.primary));
        out.push_str("\n\n[replica]\n");
        for replica in &self.nodes.replicas {
            out.push_str(&self.host_line(replica));
            out.push('\n');
        }
        out
    }

    /// Write `inventory.ini` into `ansible_dir`, returning its path.
    pub fn write_to(&self, ansible_dir: &Path) -> IacResult<PathBuf> {
        if !ansible_dir.is_dir() {
            return Err(IacError::WorkspaceMissing(ansible_dir.to_path_buf()));
        }
        let path = ansible_dir.join(INVENTORY_FILE);
        fs::write(&path, self.render())?;
        debug!("Wrote inventory with {} hosts to {:?}", self.nodes.all().count(), path);
        Ok(path)
    }
}
