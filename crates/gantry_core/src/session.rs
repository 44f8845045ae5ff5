//! Per-workspace session state: the current plan, its approval, and the
//! outcome of the last apply.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gantry_iac::{IacError, NodeAddresses, PlanOutput, TerraformOutputs};

/// Result of the most recent plan request. Superseded by the next one.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum PlanResult {
    Ready {
        output: PlanOutput,
        generation: u64,
        planned_at: DateTime<Utc>,
    },
    Failed {
        kind: String,
        message: String,
        generation: u64,
        planned_at: DateTime<Utc>,
    },
}

impl PlanResult {
    pub(crate) fn from_result(result: &Result<PlanOutput, IacError>, generation: u64) -> Self {
        let planned_at = Utc::now();
        match result {
            Ok(output) => PlanResult::Ready {
                output: output.clone(),
                generation,
                planned_at,
            },
            Err(e) => PlanResult::Failed {
                kind: e.kind().to_string(),
                message: e.to_string(),
                generation,
                planned_at,
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, PlanResult::Ready { .. })
    }
}

/// What a successful apply produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyOutput {
    pub nodes: NodeAddresses,
    pub outputs: TerraformOutputs,
    pub apply_log: String,
    pub configure_log: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// The outcome of the last apply cycle. Exactly one is current.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum ApplyOutcome {
    NotYetRun,
    InProgress,
    Denied { message: String },
    Succeeded(ApplyOutput),
    Failed { kind: String, error: String },
}

impl ApplyOutcome {
    pub(crate) fn denied() -> Self {
        ApplyOutcome::Denied {
            message: "apply cannot proceed without approval of the current plan".to_string(),
        }
    }

    pub(crate) fn cancelled() -> Self {
        ApplyOutcome::Failed {
            kind: "cancelled".to_string(),
            error: "apply cancelled".to_string(),
        }
    }

    pub(crate) fn from_error(err: &IacError) -> Self {
        ApplyOutcome::Failed {
            kind: err.kind().to_string(),
            error: err.to_string(),
        }
    }

    /// Short state name, matching the serialized tag.
    pub fn label(&self) -> &'static str {
        match self {
            ApplyOutcome::NotYetRun => "not-yet-run",
            ApplyOutcome::InProgress => "in-progress",
            ApplyOutcome::Denied { .. } => "denied",
            ApplyOutcome::Succeeded(_) => "succeeded",
            ApplyOutcome::Failed { .. } => "failed",
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, ApplyOutcome::Succeeded(_))
    }
}

/// Mutable session state. Guarded by a synchronous mutex that is never
/// held across an await point.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub plan: Option<PlanResult>,
    pub plan_generation: u64,
    /// Plan generation the approval was granted for.
    pub approved_generation: Option<u64>,
    pub outcome: ApplyOutcome,
    pub in_progress: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            plan: None,
            plan_generation: 0,
            approved_generation: None,
            outcome: ApplyOutcome::NotYetRun,
            in_progress: false,
        }
    }
}

impl SessionState {
    pub fn approval_granted(&self) -> bool {
        self.approved_generation == Some(self.plan_generation)
    }

    /// Record a new plan. Any approval given for an earlier plan lapses.
    pub fn record_plan(&mut self, result: &Result<PlanOutput, IacError>) {
        self.plan_generation += 1;
        self.approved_generation = None;
        self.plan = Some(PlanResult::from_result(result, self.plan_generation));
    }

    /// Approve the current plan. Only a successful plan can be approved.
    pub fn grant_approval(&mut self) -> bool {
        if !self.plan.as_ref().is_some_and(PlanResult::is_ready) {
            self.approved_generation = None;
            return false;
        }
        self.approved_generation = Some(self.plan_generation);
        true
    }

    pub fn revoke_approval(&mut self) {
        self.approved_generation = None;
    }

    /// Use up the approval so it cannot start a second apply.
    pub fn consume_approval(&mut self) -> bool {
        let granted = self.approval_granted();
        self.approved_generation = None;
        granted
    }
}
