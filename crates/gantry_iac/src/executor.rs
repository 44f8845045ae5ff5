//! The provisioning executor seam.
//!
//! The workflow controller drives terraform and ansible only through
//! [`ProvisioningExecutor`], so it can be tested with a fake and so the
//! tool invocation details stay in this crate.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use gantry_runner::ToolRunner;

use crate::ansible::AnsibleRunner;
use crate::error::IacResult;
use crate::inventory::Inventory;
use crate::outputs::TerraformOutputs;
use crate::plan::{DriftProbe, PlanOutput};
use crate::terraform::TerraformRunner;

/// Infrastructure and configuration operations over a workspace.
#[async_trait]
pub trait ProvisioningExecutor: Send + Sync {
    /// Compute and save a plan.
    async fn plan(&self, terraform_dir: &Path) -> IacResult<PlanOutput>;

    /// Re-plan against live state without saving, reporting pending changes.
    async fn detect_drift(&self, terraform_dir: &Path) -> IacResult<DriftProbe>;

    /// Apply the saved plan. Returns the tool log.
    async fn apply(&self, terraform_dir: &Path) -> IacResult<String>;

    /// Read the workspace outputs.
    async fn outputs(&self, terraform_dir: &Path) -> IacResult<TerraformOutputs>;

    /// Run the configuration step against the given hosts. Returns the run log.
    async fn configure(&self, inventory: &Inventory) -> IacResult<String>;
}

/// Executor backed by the terraform and ansible-playbook binaries.
pub struct TerraformExecutor {
    terraform: TerraformRunner,
    ansible: AnsibleRunner,
}

impl TerraformExecutor {
    pub fn new(runner: Arc<dyn ToolRunner>, ansible_dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            terraform: TerraformRunner::new(runner.clone()),
            ansible: AnsibleRunner::new(runner, ansible_dir),
        }
    }

    /// Bound each tool invocation by `seconds`.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.terraform = self.terraform.with_timeout(seconds);
        self.ansible = self.ansible.with_timeout(seconds);
        self
    }
}

#[async_trait]
impl ProvisioningExecutor for TerraformExecutor {
    async fn plan(&self, terraform_dir: &Path) -> IacResult<PlanOutput> {
        self.terraform.plan(terraform_dir).await
    }

    async fn detect_drift(&self, terraform_dir: &Path) -> IacResult<DriftProbe> {
        self.terraform.detect_drift(terraform_dir).await
    }

    async fn apply(&self, terraform_dir: &Path) -> IacResult<String> {
        self.terraform.apply(terraform_dir).await
    }

    async fn outputs(&self, terraform_dir: &Path) -> IacResult<TerraformOutputs> {
        self.terraform.output(terraform_dir).await
    }

    async fn configure(&self, inventory: &Inventory) -> IacResult<String> {
        self.ansible.run_playbook(inventory).await
    }
}
