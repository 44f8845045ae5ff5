//! # gantry_iac
//!
//! Terraform and Ansible execution for Gantry.
//!
//! This crate turns the abstract provisioning steps (plan, apply, read
//! outputs, probe for drift, configure) into concrete tool invocations
//! through a [`gantry_runner::ToolRunner`].
//!
//! ## Features
//!
//! - Saved-plan workflow with `terraform show -json` rendering
//! - Drift detection via `terraform plan -detailed-exitcode`
//! - Node address extraction from `terraform output -json`
//! - Inventory rendering and `ansible-playbook` runs
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use gantry_iac::{ProvisioningExecutor, TerraformExecutor};
//! use gantry_runner::ProcessRunner;
//!
//! # async fn run() -> Result<(), gantry_iac::IacError> {
//! let executor = TerraformExecutor::new(Arc::new(ProcessRunner::default()), "workspace/ansible")
//!     .with_timeout(900);
//!
//! let plan = executor.plan(Path::new("workspace/terraform")).await?;
//! println!("{}", plan.summary);
//! # Ok(())
//! # }
//! ```

pub mod ansible;
pub mod error;
pub mod executor;
pub mod inventory;
pub mod outputs;
pub mod plan;
pub mod terraform;

pub use ansible::{AnsibleRunner, PLAYBOOK_FILE};
pub use error::{IacError, IacResult};
pub use executor::{ProvisioningExecutor, TerraformExecutor};
pub use inventory::{Inventory, SshSettings, INVENTORY_FILE};
pub use outputs::{
    parse_outputs, NodeAddresses, OutputValue, TerraformOutputs, PRIMARY_OUTPUT,
    REPLICA_LIST_OUTPUT,
};
pub use plan::{DriftProbe, PlanOutput, PlanSummary, PLAN_FILE};
pub use terraform::{TerraformResult, TerraformRunner};
