//! Plan and drift results.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{IacError, IacResult};

/// Name of the saved plan artifact inside the terraform workspace.
pub const PLAN_FILE: &str = "tfplan";

/// Counts of planned resource actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub replace: usize,
    pub no_op: usize,
}

impl PlanSummary {
    /// Summarize the `resource_changes` of a `terraform show -json` document.
    ///
    /// A replacement shows up as `["delete", "create"]` (or the reverse for
    /// create-before-destroy) and is counted once as `replace`.
    pub fn from_plan_json(plan: &serde_json::Value) -> Self {
        let mut summary = Self::default();
        let changes = plan
            .get("resource_changes")
            .and_then(|c| c.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default();

        for change in changes {
            let actions: Vec<&str> = change
                .pointer("/change/actions")
                .and_then(|a| a.as_array())
                .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
                .unwrap_or_default();

            match actions.as_slice() {
                ["create"] => summary.create += 1,
                ["update"] => summary.update += 1,
                ["delete"] => summary.delete += 1,
                ["delete", "create"] | ["create", "delete"] => summary.replace += 1,
                _ => summary.no_op += 1,
            }
        }
        summary
    }

    pub fn has_changes(&self) -> bool {
        self.create + self.update + self.delete + self.replace > 0
    }
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to add, {} to change, {} to destroy, {} to replace",
            self.create, self.update, self.delete, self.replace
        )
    }
}

/// A successful plan: the saved plan file and its JSON rendering.
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutput {
    pub plan_file: PathBuf,
    pub summary: PlanSummary,
    pub raw: serde_json::Value,
}

impl PlanOutput {
    /// Build from the stdout of `terraform show -json`.
    pub fn from_show_json(plan_file: PathBuf, stdout: &str) -> IacResult<Self> {
        let raw: serde_json::Value =
            serde_json::from_str(stdout).map_err(|source| IacError::OutputParse {
                context: "terraform show -json".to_string(),
                source,
            })?;
        Ok(Self {
            plan_file,
            summary: PlanSummary::from_plan_json(&raw),
            raw,
        })
    }
}

/// Result of a drift probe against live infrastructure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriftProbe {
    InSync,
    Drifted { diff: String },
}
