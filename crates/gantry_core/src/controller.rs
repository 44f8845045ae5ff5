//! The approval-gated apply workflow.
//!
//! One [`ApplyController`] owns one workspace. Every operation that touches
//! the workspace (generate, plan, apply, drift probe) runs under the
//! workspace lock; session state sits behind a separate synchronous mutex
//! that is never held across an await.
//!
//! ```text
//! NoPlan -> Planned(not approved) -> Planned(approved) -> Applying
//!                ^                                          |
//!                +------------- request_plan --------- Applied | ApplyFailed | Denied
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use gantry_iac::{
    DriftProbe, IacError, Inventory, NodeAddresses, PlanOutput, ProvisioningExecutor,
    SshSettings,
};
use gantry_spec::{ProvisioningRequest, RequestValidator};
use gantry_templates::{ArtifactGenerator, ArtifactTargets};

use crate::error::{CoreError, CoreResult};
use crate::handle::{ApplyHandle, InProgressGuard};
use crate::session::{ApplyOutcome, ApplyOutput, PlanResult, SessionState};
use crate::settings::ControllerSettings;
use crate::status::ApplyStatus;

/// Acknowledgement of a generate request.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateAck {
    pub terraform_dir: PathBuf,
    pub ansible_dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Answer to an approval decision.
#[derive(Debug, Clone)]
pub enum ApprovalAck {
    /// Approval recorded and the apply started in the background.
    Started(ApplyHandle),
    /// Approval withheld or withdrawn; nothing runs.
    Declined,
    /// The current plan is missing or failed, so there is nothing to approve.
    PlanNotReady,
    /// An apply is already running; this approval was not recorded.
    AlreadyRunning,
}

impl ApprovalAck {
    pub fn message(&self) -> &'static str {
        match self {
            ApprovalAck::Started(_) => "Approval granted. Apply started in the background.",
            ApprovalAck::Declined => "Approval not granted. Nothing will be applied.",
            ApprovalAck::PlanNotReady => {
                "No successful plan to approve. Run a new plan before approving."
            }
            ApprovalAck::AlreadyRunning => {
                "An apply is already in progress. Approval was not recorded."
            }
        }
    }

    pub fn handle(&self) -> Option<&ApplyHandle> {
        match self {
            ApprovalAck::Started(handle) => Some(handle),
            _ => None,
        }
    }
}

/// How a request to start an apply was resolved.
enum ApplyStart {
    Started(InProgressGuard, tokio::sync::watch::Receiver<Option<ApplyOutcome>>),
    AlreadyRunning,
    Denied,
}

/// Why the apply pipeline stopped early.
enum ApplyFailure {
    Denied,
    Iac(IacError),
}

impl From<IacError> for ApplyFailure {
    fn from(err: IacError) -> Self {
        ApplyFailure::Iac(err)
    }
}

struct ControllerInner {
    settings: ControllerSettings,
    ssh: SshSettings,
    executor: Arc<dyn ProvisioningExecutor>,
    generator: Arc<dyn ArtifactGenerator>,
    validator: RequestValidator,
    workspace_lock: tokio::sync::Mutex<()>,
    session: Arc<Mutex<SessionState>>,
    active: Mutex<Option<ApplyHandle>>,
    apply_started: Notify,
}

/// Serializes plan, approval and apply for one workspace.
#[derive(Clone)]
pub struct ApplyController {
    inner: Arc<ControllerInner>,
}

impl ApplyController {
    /// Build a controller. Settings are validated here.
    pub fn new(
        settings: ControllerSettings,
        executor: Arc<dyn ProvisioningExecutor>,
        generator: Arc<dyn ArtifactGenerator>,
    ) -> CoreResult<Self> {
        settings.validate()?;
        let ssh = settings.ssh_settings()?;
        Ok(Self {
            inner: Arc::new(ControllerInner {
                settings,
                ssh,
                executor,
                generator,
                validator: RequestValidator::new(),
                workspace_lock: tokio::sync::Mutex::new(()),
                session: Arc::new(Mutex::new(SessionState::default())),
                active: Mutex::new(None),
                apply_started: Notify::new(),
            }),
        })
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.inner.settings
    }

    /// Validate the request and render artifacts into the workspace.
    pub async fn generate(&self, request: ProvisioningRequest) -> CoreResult<GenerateAck> {
        let warnings = self.inner.validator.ensure_valid(&request)?;
        for warning in &warnings {
            warn!("{}", warning);
        }
        let password =
            request.resolve_replication_password(self.inner.settings.replication_password.as_ref())?;

        let targets = ArtifactTargets::new(
            self.inner.settings.terraform_dir.clone(),
            self.inner.settings.ansible_dir.clone(),
        );

        let _workspace = self.inner.workspace_lock.lock().await;
        info!(
            "Generating artifacts for {} replicas in {}",
            request.num_replicas, request.aws_region
        );
        let artifacts = self.inner.generator.generate(&request, &password, &targets)?;

        Ok(GenerateAck {
            terraform_dir: targets.terraform_dir,
            ansible_dir: targets.ansible_dir,
            files: artifacts.files,
            warnings,
        })
    }

    /// Compute a new plan. Always revokes any earlier approval.
    pub async fn request_plan(&self) -> CoreResult<PlanOutput> {
        let _workspace = self.inner.workspace_lock.lock().await;
        info!("Planning {:?}", self.inner.settings.terraform_dir);

        let result = self.inner.executor.plan(&self.inner.settings.terraform_dir).await;
        self.inner.session.lock().record_plan(&result);

        match result {
            Ok(plan) => {
                info!("Plan ready ({}); awaiting approval", plan.summary);
                Ok(plan)
            }
            Err(e) => {
                error!("Plan failed: {}", e);
                Err(CoreError::Plan(e))
            }
        }
    }

    /// Record an approval decision. Never blocks on the workspace.
    pub fn submit_approval(&self, approved: bool) -> ApprovalAck {
        if !approved {
            let mut state = self.inner.session.lock();
            state.revoke_approval();
            info!("Approval withheld for plan generation {}", state.plan_generation);
            return ApprovalAck::Declined;
        }

        let (guard, done) = {
            let mut state = self.inner.session.lock();
            if state.in_progress {
                warn!("Approval rejected: an apply is already running");
                return ApprovalAck::AlreadyRunning;
            }
            if !state.grant_approval() {
                warn!("Approval rejected: the current plan did not succeed");
                state.outcome = ApplyOutcome::denied();
                return ApprovalAck::PlanNotReady;
            }
            info!("Approval granted for plan generation {}", state.plan_generation);
            match self.inner.begin_apply(&mut state) {
                ApplyStart::Started(guard, done) => (guard, done),
                // Approval was granted under the same lock
                ApplyStart::AlreadyRunning | ApplyStart::Denied => {
                    return ApprovalAck::AlreadyRunning
                }
            }
        };

        let inner = self.inner.clone();
        let task = tokio::spawn(async move { inner.execute_apply(guard).await });
        let handle = ApplyHandle::new(task.abort_handle(), done);
        *self.inner.active.lock() = Some(handle.clone());
        ApprovalAck::Started(handle)
    }

    /// Run the apply in the caller's task.
    ///
    /// Returns `in-progress` if another apply is running and `denied` if the
    /// current plan is not approved; neither case touches the workspace.
    pub async fn run_apply(&self) -> ApplyOutcome {
        let start = {
            let mut state = self.inner.session.lock();
            self.inner.begin_apply(&mut state)
        };
        match start {
            ApplyStart::Started(guard, _) => self.inner.execute_apply(guard).await,
            ApplyStart::AlreadyRunning => ApplyOutcome::InProgress,
            ApplyStart::Denied => ApplyOutcome::denied(),
        }
    }

    /// Report apply progress, probing for drift once an apply cycle ended.
    pub async fn query_status(&self) -> ApplyStatus {
        let apply_started = self.inner.apply_started.notified();
        tokio::pin!(apply_started);
        apply_started.as_mut().enable();

        if let Err(status) = self.inner.settled_outcome() {
            return status;
        }

        // An apply that starts while we wait for the lock would hold it for
        // its whole run; report it instead of waiting.
        let _workspace = tokio::select! {
            guard = self.inner.workspace_lock.lock() => guard,
            _ = &mut apply_started => return ApplyStatus::Running,
        };

        let outcome = match self.inner.settled_outcome() {
            Ok(outcome) => outcome,
            Err(status) => return status,
        };

        debug!("Probing {:?} for drift", self.inner.settings.terraform_dir);
        match self
            .inner
            .executor
            .detect_drift(&self.inner.settings.terraform_dir)
            .await
        {
            Ok(DriftProbe::InSync) => ApplyStatus::Completed { outcome },
            Ok(DriftProbe::Drifted { diff }) => {
                warn!("Drift detected in {:?}", self.inner.settings.terraform_dir);
                ApplyStatus::DriftDetected { diff }
            }
            Err(e) => {
                let err = CoreError::DriftCheck(e);
                error!("{}", err);
                ApplyStatus::Error {
                    message: err.to_string(),
                }
            }
        }
    }

    pub fn current_plan(&self) -> Option<PlanResult> {
        self.inner.session.lock().plan.clone()
    }

    pub fn approval_granted(&self) -> bool {
        self.inner.session.lock().approval_granted()
    }

    pub fn outcome(&self) -> ApplyOutcome {
        self.inner.session.lock().outcome.clone()
    }

    pub fn is_applying(&self) -> bool {
        self.inner.session.lock().in_progress
    }

    /// Handle to the most recently started background apply.
    pub fn active_apply(&self) -> Option<ApplyHandle> {
        self.inner.active.lock().clone()
    }

    /// Cancel any background apply and wait for it to unwind.
    pub async fn shutdown(&self) {
        let active = self.inner.active.lock().take();
        if let Some(handle) = active {
            if !handle.is_finished() {
                info!("Cancelling in-flight apply");
                handle.abort();
            }
            let outcome = handle.wait().await;
            debug!("Apply ended as {}", outcome.label());
        }
    }
}

impl ControllerInner {
    /// Decide whether an apply may start and, if so, mark it in progress.
    fn begin_apply(&self, state: &mut SessionState) -> ApplyStart {
        if state.in_progress {
            return ApplyStart::AlreadyRunning;
        }
        if !state.approval_granted() {
            warn!("Apply requested without approval of the current plan");
            state.outcome = ApplyOutcome::denied();
            return ApplyStart::Denied;
        }
        state.in_progress = true;
        state.outcome = ApplyOutcome::InProgress;
        self.apply_started.notify_waiters();
        let (guard, done) = InProgressGuard::new(self.session.clone());
        ApplyStart::Started(guard, done)
    }

    /// The outcome a drift probe reports alongside, or the status to answer
    /// without probing.
    fn settled_outcome(&self) -> Result<ApplyOutcome, ApplyStatus> {
        let state = self.session.lock();
        if state.in_progress {
            return Err(ApplyStatus::Running);
        }
        match &state.outcome {
            ApplyOutcome::NotYetRun => Err(ApplyStatus::Pending),
            ApplyOutcome::InProgress => Err(ApplyStatus::Running),
            other => Ok(other.clone()),
        }
    }

    async fn execute_apply(&self, guard: InProgressGuard) -> ApplyOutcome {
        let _guard = guard;
        let outcome = match self.apply_pipeline().await {
            Ok(output) => {
                info!(
                    "Apply succeeded: primary {}, {} replicas",
                    output.nodes.primary,
                    output.nodes.replicas.len()
                );
                ApplyOutcome::Succeeded(output)
            }
            Err(ApplyFailure::Denied) => {
                warn!("Approval was revoked by a newer plan before apply started");
                ApplyOutcome::denied()
            }
            Err(ApplyFailure::Iac(e)) => {
                error!("Apply failed: {}", e);
                ApplyOutcome::from_error(&e)
            }
        };
        self.session.lock().outcome = outcome.clone();
        outcome
    }

    async fn apply_pipeline(&self) -> Result<ApplyOutput, ApplyFailure> {
        let _workspace = self.workspace_lock.lock().await;
        if !self.session.lock().consume_approval() {
            return Err(ApplyFailure::Denied);
        }

        let started_at = Utc::now();
        let terraform_dir = &self.settings.terraform_dir;

        info!("Applying saved plan in {:?}", terraform_dir);
        let apply_log = self.executor.apply(terraform_dir).await?;
        let outputs = self.executor.outputs(terraform_dir).await?;
        let nodes = NodeAddresses::from_outputs(&outputs)?;

        if self.settings.settle_delay_secs > 0 {
            info!(
                "Waiting {}s for instances to boot",
                self.settings.settle_delay_secs
            );
            tokio::time::sleep(Duration::from_secs(self.settings.settle_delay_secs)).await;
        }

        let inventory = Inventory::new(nodes.clone(), self.ssh.clone());
        let configure_log = self.executor.configure(&inventory).await?;

        Ok(ApplyOutput {
            nodes,
            outputs,
            apply_log,
            configure_log,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
