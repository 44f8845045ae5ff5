//! Integration tests for the apply workflow controller.
//!
//! The provisioning executor is replaced by a scripted fake so the tests can
//! hold an apply or a plan open and observe the controller in between.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::sync::Notify;

use gantry_core::{
    ApplyController, ApplyOutcome, ApplyStatus, ApprovalAck, ControllerSettings, CoreError,
    PlanResult,
};
use gantry_iac::{
    parse_outputs, DriftProbe, IacError, IacResult, Inventory, PlanOutput, ProvisioningExecutor,
    TerraformOutputs,
};
use gantry_spec::{ProvisioningRequest, Secret};
use gantry_templates::{
    ArtifactGenerator, ArtifactTargets, GeneratedArtifacts, TemplateGenerator, TemplateResult,
};

const PLAN_JSON: &str = r#"{
  "resource_changes": [
    {"address": "aws_instance.primary", "change": {"actions": ["create"]}},
    {"address": "aws_instance.replica[0]", "change": {"actions": ["create"]}},
    {"address": "aws_instance.replica[1]", "change": {"actions": ["create"]}}
  ]
}"#;

const OUTPUTS_JSON: &str = r#"{
  "primary_instance_ip": {"value": "54.10.0.1", "type": "string", "sensitive": false},
  "replica_instance_ips": {"value": ["54.10.0.2", "54.10.0.3"], "type": ["list", "string"], "sensitive": false}
}"#;

const REQUEST_YAML: &str = r#"
instance_type: t3.medium
num_replicas: 2
aws_region: eu-west-1
ssh_key_name: ops-key
subnet_id: subnet-0abc123
postgres_version: "16"
max_connections: 200
shared_buffers: 256MB
replication_user: replicator
"#;

#[derive(Debug, Clone)]
enum DriftScript {
    InSync,
    Drifted(String),
    Fail,
}

/// Scripted executor. Plans, drift probes and applies can be held open with
/// gates.
struct FakeExecutor {
    plan_calls: AtomicUsize,
    drift_calls: AtomicUsize,
    apply_calls: AtomicUsize,
    configure_calls: AtomicUsize,
    plan_gate: Mutex<Option<Arc<Notify>>>,
    plan_entered: Notify,
    plan_error: Mutex<Option<String>>,
    drift_gate: Mutex<Option<Arc<Notify>>>,
    drift_entered: Notify,
    apply_gate: Mutex<Option<Arc<Notify>>>,
    apply_entered: Notify,
    apply_error: Mutex<Option<String>>,
    outputs: Mutex<String>,
    drift: Mutex<DriftScript>,
    configured: Mutex<Option<Inventory>>,
}

impl FakeExecutor {
    fn new() -> Self {
        Self {
            plan_calls: AtomicUsize::new(0),
            drift_calls: AtomicUsize::new(0),
            apply_calls: AtomicUsize::new(0),
            configure_calls: AtomicUsize::new(0),
            plan_gate: Mutex::new(None),
            plan_entered: Notify::new(),
            plan_error: Mutex::new(None),
            drift_gate: Mutex::new(None),
            drift_entered: Notify::new(),
            apply_gate: Mutex::new(None),
            apply_entered: Notify::new(),
            apply_error: Mutex::new(None),
            outputs: Mutex::new(OUTPUTS_JSON.to_string()),
            drift: Mutex::new(DriftScript::InSync),
            configured: Mutex::new(None),
        }
    }

    fn hold_plans(&self) {
        *self.plan_gate.lock() = Some(Arc::new(Notify::new()));
    }

    fn release_plans(&self) {
        if let Some(gate) = self.plan_gate.lock().take() {
            gate.notify_one();
        }
    }

    /// Fail the next plans, leaving whatever plan file is on disk.
    fn fail_plans(&self, stderr: &str) {
        *self.plan_error.lock() = Some(stderr.to_string());
    }

    fn hold_drift_probes(&self) {
        *self.drift_gate.lock() = Some(Arc::new(Notify::new()));
    }

    fn release_drift_probes(&self) {
        if let Some(gate) = self.drift_gate.lock().take() {
            gate.notify_one();
        }
    }

    fn hold_applies(&self) {
        *self.apply_gate.lock() = Some(Arc::new(Notify::new()));
    }

    fn release_applies(&self) {
        if let Some(gate) = self.apply_gate.lock().take() {
            gate.notify_one();
        }
    }

    fn fail_apply(&self, stderr: &str) {
        *self.apply_error.lock() = Some(stderr.to_string());
    }

    fn set_drift(&self, drift: DriftScript) {
        *self.drift.lock() = drift;
    }

    fn plans(&self) -> usize {
        self.plan_calls.load(Ordering::SeqCst)
    }

    fn drift_probes(&self) -> usize {
        self.drift_calls.load(Ordering::SeqCst)
    }

    fn applies(&self) -> usize {
        self.apply_calls.load(Ordering::SeqCst)
    }

    fn configures(&self) -> usize {
        self.configure_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProvisioningExecutor for FakeExecutor {
    async fn plan(&self, terraform_dir: &Path) -> IacResult<PlanOutput> {
        self.plan_calls.fetch_add(1, Ordering::SeqCst);
        if !terraform_dir.is_dir() {
            return Err(IacError::WorkspaceMissing(terraform_dir.to_path_buf()));
        }
        let gate = self.plan_gate.lock().clone();
        if let Some(gate) = gate {
            self.plan_entered.notify_one();
            gate.notified().await;
        }
        let error = self.plan_error.lock().clone();
        if let Some(stderr) = error {
            return Err(IacError::Execution {
                tool: "terraform plan".to_string(),
                exit_code: 1,
                stderr,
            });
        }
        fs::write(terraform_dir.join("tfplan"), b"plan")?;
        PlanOutput::from_show_json(terraform_dir.join("tfplan"), PLAN_JSON)
    }

    async fn detect_drift(&self, _terraform_dir: &Path) -> IacResult<DriftProbe> {
        self.drift_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.drift_gate.lock().clone();
        if let Some(gate) = gate {
            self.drift_entered.notify_one();
            gate.notified().await;
        }
        let script = self.drift.lock().clone();
        match script {
            DriftScript::InSync => Ok(DriftProbe::InSync),
            DriftScript::Drifted(diff) => Ok(DriftProbe::Drifted { diff }),
            DriftScript::Fail => Err(IacError::Execution {
                tool: "terraform plan".to_string(),
                exit_code: 1,
                stderr: "Error: state lock held".to_string(),
            }),
        }
    }

    async fn apply(&self, terraform_dir: &Path) -> IacResult<String> {
        self.apply_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.apply_gate.lock().clone();
        if let Some(gate) = gate {
            self.apply_entered.notify_one();
            gate.notified().await;
        }
        let error = self.apply_error.lock().clone();
        if let Some(stderr) = error {
            return Err(IacError::Execution {
                tool: "terraform apply".to_string(),
                exit_code: 1,
                stderr,
            });
        }
        let plan = terraform_dir.join("tfplan");
        if !plan.is_file() {
            return Err(IacError::PlanMissing(plan));
        }
        fs::remove_file(plan)?;
        Ok("Apply complete! Resources: 3 added, 0 changed, 0 destroyed.".to_string())
    }

    async fn outputs(&self, _terraform_dir: &Path) -> IacResult<TerraformOutputs> {
        let outputs = self.outputs.lock().clone();
        parse_outputs(&outputs)
    }

    async fn configure(&self, inventory: &Inventory) -> IacResult<String> {
        self.configure_calls.fetch_add(1, Ordering::SeqCst);
        *self.configured.lock() = Some(inventory.clone());
        Ok("PLAY RECAP failed=0".to_string())
    }
}

mock! {
    pub Generator {}

    impl ArtifactGenerator for Generator {
        fn generate(
            &self,
            request: &ProvisioningRequest,
            replication_password: &Secret,
            targets: &ArtifactTargets,
        ) -> TemplateResult<GeneratedArtifacts>;
    }
}

struct Harness {
    root: TempDir,
    controller: ApplyController,
    executor: Arc<FakeExecutor>,
}

impl Harness {
    fn terraform_dir(&self) -> PathBuf {
        self.root.path().join("terraform")
    }
}

fn templates_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates")
}

fn settings_in(root: &Path) -> ControllerSettings {
    fs::create_dir_all(root.join("terraform")).unwrap();
    fs::create_dir_all(root.join("ansible")).unwrap();
    let key = root.join("id_ed25519");
    fs::write(&key, "key").unwrap();

    ControllerSettings::default()
        .with_workspace(root.join("terraform"), root.join("ansible"))
        .with_template_dir(templates_root())
        .with_ssh_key(key)
        .with_settle_delay(0)
        .with_replication_password(Secret::new("configured-replication-pw"))
}

fn harness_with(generator: Arc<dyn ArtifactGenerator>) -> Harness {
    let root = tempfile::tempdir().unwrap();
    let settings = settings_in(root.path());
    let executor = Arc::new(FakeExecutor::new());
    let controller = ApplyController::new(settings, executor.clone(), generator).unwrap();
    Harness {
        root,
        controller,
        executor,
    }
}

fn harness() -> Harness {
    harness_with(Arc::new(TemplateGenerator::new(templates_root())))
}

fn request() -> ProvisioningRequest {
    ProvisioningRequest::from_yaml_str(REQUEST_YAML).unwrap()
}

async fn approve_and_wait(controller: &ApplyController) -> ApplyOutcome {
    match controller.submit_approval(true) {
        ApprovalAck::Started(handle) => handle.wait().await,
        other => panic!("apply did not start: {:?}", other),
    }
}

/// Test a full cycle: generate, plan, decline, approve, complete.
#[tokio::test]
async fn test_end_to_end_two_replicas() {
    let h = harness();
    h.executor.hold_applies();

    let ack = h.controller.generate(request()).await.unwrap();
    assert_eq!(ack.files.len(), 5);
    assert!(fs::read_to_string(h.terraform_dir().join("variables.tf"))
        .unwrap()
        .contains("default     = 2"));

    let plan = h.controller.request_plan().await.unwrap();
    assert!(plan.summary.has_changes());
    assert_eq!(plan.summary.create, 3);

    assert!(matches!(
        h.controller.submit_approval(false),
        ApprovalAck::Declined
    ));
    assert_eq!(h.controller.query_status().await, ApplyStatus::Pending);
    assert_eq!(h.executor.applies(), 0);

    let handle = match h.controller.submit_approval(true) {
        ApprovalAck::Started(handle) => handle,
        other => panic!("apply did not start: {:?}", other),
    };
    assert_eq!(h.controller.query_status().await, ApplyStatus::Running);

    h.executor.release_applies();
    let outcome = handle.wait().await;

    let output = match &outcome {
        ApplyOutcome::Succeeded(output) => output.clone(),
        other => panic!("apply failed: {:?}", other),
    };
    assert_eq!(output.nodes.primary, "54.10.0.1");
    assert_eq!(output.nodes.replicas, vec!["54.10.0.2", "54.10.0.3"]);
    assert!(output.configure_log.contains("PLAY RECAP"));

    let inventory = h.executor.configured.lock().clone().unwrap();
    assert_eq!(inventory.ssh.user, "ubuntu");
    assert_eq!(inventory.nodes, output.nodes);

    match h.controller.query_status().await {
        ApplyStatus::Completed { outcome } => assert!(outcome.is_succeeded()),
        other => panic!("unexpected status: {:?}", other),
    }
    assert_eq!(h.executor.drift_probes(), 1);
    assert!(!h.controller.approval_granted());
}

/// Test apply without approval is denied and leaves the workspace alone.
#[tokio::test]
async fn test_apply_without_approval_is_denied() {
    let h = harness();
    h.controller.request_plan().await.unwrap();

    let outcome = h.controller.run_apply().await;

    assert!(matches!(outcome, ApplyOutcome::Denied { .. }));
    assert_eq!(h.executor.applies(), 0);
    assert!(h.terraform_dir().join("tfplan").exists());
    match h.controller.query_status().await {
        ApplyStatus::Completed {
            outcome: ApplyOutcome::Denied { .. },
        } => {}
        other => panic!("unexpected status: {:?}", other),
    }
}

/// Test a plan against a missing workspace is recorded and nothing applies.
#[tokio::test]
async fn test_plan_on_missing_workspace() {
    let h = harness();
    fs::remove_dir_all(h.terraform_dir()).unwrap();

    let err = h.controller.request_plan().await.unwrap_err();
    assert!(matches!(err, CoreError::Plan(IacError::WorkspaceMissing(_))));

    match h.controller.current_plan() {
        Some(PlanResult::Failed { kind, .. }) => assert_eq!(kind, "workspace-missing"),
        other => panic!("unexpected plan: {:?}", other),
    }
    assert_eq!(h.controller.query_status().await, ApplyStatus::Pending);
    assert_eq!(h.executor.drift_probes(), 0);
}

/// Test every plan leaves approval revoked, whatever came before.
#[tokio::test]
async fn test_plan_always_resets_approval() {
    let h = harness();

    for _ in 0..3 {
        h.controller.request_plan().await.unwrap();
        assert!(!h.controller.approval_granted());

        h.executor.hold_applies();
        let ack = h.controller.submit_approval(true);
        // Approval stays granted until the apply task consumes it
        assert!(h.controller.approval_granted());
        h.executor.release_applies();
        ack.handle().unwrap().wait().await;

        h.controller.request_plan().await.unwrap();
        assert!(!h.controller.approval_granted());
    }
}

/// Test status during an apply reports running without calling the executor.
#[tokio::test]
async fn test_status_while_running_skips_executor() {
    let h = harness();
    h.controller.request_plan().await.unwrap();
    h.executor.hold_applies();

    let ack = h.controller.submit_approval(true);
    h.executor.apply_entered.notified().await;

    let plans_before = h.executor.plans();
    for _ in 0..5 {
        assert_eq!(h.controller.query_status().await, ApplyStatus::Running);
    }
    assert_eq!(h.executor.plans(), plans_before);
    assert_eq!(h.executor.drift_probes(), 0);

    h.executor.release_applies();
    ack.handle().unwrap().wait().await;
}

/// Test the denied path never waits for the workspace lock.
#[tokio::test]
async fn test_denied_apply_does_not_take_workspace_lock() {
    let h = harness();
    h.executor.hold_plans();

    let controller = h.controller.clone();
    let plan_task = tokio::spawn(async move { controller.request_plan().await });
    h.executor.plan_entered.notified().await;

    // The plan task holds the workspace lock right now
    let outcome = tokio::time::timeout(Duration::from_secs(1), h.controller.run_apply())
        .await
        .expect("denied apply waited for the workspace lock");
    assert!(matches!(outcome, ApplyOutcome::Denied { .. }));

    h.executor.release_plans();
    plan_task.await.unwrap().unwrap();
}

/// Test a plan finishing after approval revokes it before apply starts.
#[tokio::test]
async fn test_plan_during_pending_apply_revokes_approval() {
    let h = harness();
    h.controller.request_plan().await.unwrap();

    h.executor.hold_plans();
    let controller = h.controller.clone();
    let plan_task = tokio::spawn(async move { controller.request_plan().await });
    h.executor.plan_entered.notified().await;

    let ack = h.controller.submit_approval(true);
    assert_eq!(h.controller.query_status().await, ApplyStatus::Running);

    h.executor.release_plans();
    plan_task.await.unwrap().unwrap();

    let outcome = ack.handle().unwrap().wait().await;
    assert!(matches!(outcome, ApplyOutcome::Denied { .. }));
    assert_eq!(h.executor.applies(), 0);
    assert!(!h.controller.is_applying());
}

/// Test a second approval while an apply runs is rejected.
#[tokio::test]
async fn test_overlapping_approval_rejected() {
    let h = harness();
    h.controller.request_plan().await.unwrap();
    h.executor.hold_applies();

    let first = h.controller.submit_approval(true);
    assert!(first.handle().is_some());

    let second = h.controller.submit_approval(true);
    assert!(matches!(second, ApprovalAck::AlreadyRunning));
    assert!(matches!(
        h.controller.run_apply().await,
        ApplyOutcome::InProgress
    ));

    h.executor.release_applies();
    assert!(first.handle().unwrap().wait().await.is_succeeded());
    assert_eq!(h.executor.applies(), 1);
}

/// Test aborting an apply clears the in-progress marker.
#[tokio::test]
async fn test_abort_records_cancellation() {
    let h = harness();
    h.controller.request_plan().await.unwrap();
    h.executor.hold_applies();

    let ack = h.controller.submit_approval(true);
    h.executor.apply_entered.notified().await;
    let handle = ack.handle().unwrap();
    handle.abort();

    let outcome = handle.wait().await;
    assert_eq!(
        outcome,
        ApplyOutcome::Failed {
            kind: "cancelled".to_string(),
            error: "apply cancelled".to_string(),
        }
    );
    assert!(!h.controller.is_applying());
    assert_eq!(h.executor.configures(), 0);
    match h.controller.query_status().await {
        ApplyStatus::Completed { outcome } => assert_eq!(outcome.label(), "failed"),
        other => panic!("unexpected status: {:?}", other),
    }
}

/// Test shutdown cancels an apply that has not even been polled yet.
#[tokio::test]
async fn test_shutdown_cancels_unstarted_apply() {
    let h = harness();
    h.controller.request_plan().await.unwrap();

    let ack = h.controller.submit_approval(true);
    assert!(h.controller.is_applying());
    h.controller.shutdown().await;

    assert!(!h.controller.is_applying());
    assert!(ack.handle().unwrap().is_finished());
    assert_eq!(h.executor.applies(), 0);
}

/// Test apply failures are captured in the outcome.
#[tokio::test]
async fn test_apply_failure_captured() {
    let h = harness();
    h.controller.request_plan().await.unwrap();
    h.executor.fail_apply("Error: InsufficientInstanceCapacity");

    let outcome = approve_and_wait(&h.controller).await;
    match outcome {
        ApplyOutcome::Failed { kind, error } => {
            assert_eq!(kind, "tool-failed");
            assert!(error.contains("InsufficientInstanceCapacity"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(h.executor.configures(), 0);

    // A failed apply is still checked for drift
    match h.controller.query_status().await {
        ApplyStatus::Completed { outcome } => assert_eq!(outcome.label(), "failed"),
        other => panic!("unexpected status: {:?}", other),
    }
    assert_eq!(h.executor.drift_probes(), 1);

    h.executor
        .set_drift(DriftScript::Drifted("+ aws_instance.replica[0]".to_string()));
    assert!(matches!(
        h.controller.query_status().await,
        ApplyStatus::DriftDetected { .. }
    ));
}

/// Test approving before any plan exists is refused.
#[tokio::test]
async fn test_approval_without_plan() {
    let h = harness();
    // Left over from an earlier controller run
    fs::write(h.terraform_dir().join("tfplan"), b"old plan").unwrap();

    let ack = h.controller.submit_approval(true);

    assert!(matches!(ack, ApprovalAck::PlanNotReady));
    assert!(!h.controller.approval_granted());
    assert!(!h.controller.is_applying());
    assert!(matches!(h.controller.outcome(), ApplyOutcome::Denied { .. }));
    assert_eq!(h.executor.applies(), 0);
}

/// Test a failed plan cannot be approved, even with an older plan on disk.
#[tokio::test]
async fn test_approval_after_failed_plan_refused() {
    let h = harness();
    h.controller.request_plan().await.unwrap();
    h.executor.fail_plans("Error: Invalid reference");

    let err = h.controller.request_plan().await.unwrap_err();
    assert!(matches!(err, CoreError::Plan(IacError::Execution { .. })));
    assert!(matches!(
        h.controller.current_plan(),
        Some(PlanResult::Failed { .. })
    ));
    assert!(h.terraform_dir().join("tfplan").exists());

    let ack = h.controller.submit_approval(true);
    assert!(matches!(ack, ApprovalAck::PlanNotReady));
    assert!(ack.handle().is_none());
    assert!(matches!(h.controller.outcome(), ApplyOutcome::Denied { .. }));
    assert_eq!(h.executor.applies(), 0);
}

/// Test withdrawing approval before the apply gets the workspace denies it.
#[tokio::test]
async fn test_withdrawn_approval_denies_pending_apply() {
    let h = harness();
    h.controller.request_plan().await.unwrap();
    assert!(matches!(
        h.controller.run_apply().await,
        ApplyOutcome::Denied { .. }
    ));

    // A drift probe holds the workspace lock
    h.executor.hold_drift_probes();
    let controller = h.controller.clone();
    let status_task = tokio::spawn(async move { controller.query_status().await });
    h.executor.drift_entered.notified().await;

    let ack = h.controller.submit_approval(true);
    assert!(ack.handle().is_some());
    assert!(matches!(
        h.controller.submit_approval(false),
        ApprovalAck::Declined
    ));
    assert!(!h.controller.approval_granted());

    h.executor.release_drift_probes();
    status_task.await.unwrap();

    let outcome = ack.handle().unwrap().wait().await;
    assert!(matches!(outcome, ApplyOutcome::Denied { .. }));
    assert_eq!(h.executor.applies(), 0);
    assert!(h.terraform_dir().join("tfplan").exists());
}

/// Test missing outputs fail the apply before configuration.
#[tokio::test]
async fn test_missing_primary_output() {
    let h = harness();
    *h.executor.outputs.lock() = "{}".to_string();
    h.controller.request_plan().await.unwrap();

    let outcome = approve_and_wait(&h.controller).await;
    assert!(matches!(outcome, ApplyOutcome::Failed { .. }));
    assert_eq!(h.executor.configures(), 0);
}

/// Test drift after a successful apply and a failing drift probe.
#[tokio::test]
async fn test_drift_reporting() {
    let h = harness();
    h.controller.request_plan().await.unwrap();
    assert!(approve_and_wait(&h.controller).await.is_succeeded());

    h.executor
        .set_drift(DriftScript::Drifted("~ aws_instance.replica[1]".to_string()));
    assert_eq!(
        h.controller.query_status().await,
        ApplyStatus::DriftDetected {
            diff: "~ aws_instance.replica[1]".to_string()
        }
    );

    h.executor.set_drift(DriftScript::Fail);
    match h.controller.query_status().await {
        ApplyStatus::Error { message } => assert!(message.contains("state lock held")),
        other => panic!("unexpected status: {:?}", other),
    }
    assert!(h.controller.outcome().is_succeeded());
}

/// Test concurrent plans and status queries always finish.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_plan_and_status() {
    let h = harness();
    h.controller.request_plan().await.unwrap();
    assert!(approve_and_wait(&h.controller).await.is_succeeded());

    let mut tasks = Vec::new();
    for i in 0..20 {
        let controller = h.controller.clone();
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                controller.request_plan().await.map(|_| ())
            } else {
                controller.query_status().await;
                Ok(())
            }
        }));
    }

    tokio::time::timeout(Duration::from_secs(10), async {
        for task in tasks {
            task.await.unwrap().unwrap();
        }
    })
    .await
    .expect("plan and status deadlocked");

    assert_eq!(h.executor.plans(), 11);
    assert!(!h.controller.approval_granted());
}

/// Test generating twice yields byte-identical files.
#[tokio::test]
async fn test_generate_is_idempotent() {
    let h = harness();

    let first = h.controller.generate(request()).await.unwrap();
    let snapshot: Vec<Vec<u8>> = first.files.iter().map(|f| fs::read(f).unwrap()).collect();

    let second = h.controller.generate(request()).await.unwrap();
    assert_eq!(first.files, second.files);
    for (file, before) in second.files.iter().zip(snapshot) {
        assert_eq!(fs::read(file).unwrap(), before, "{:?} changed", file);
    }
}

/// Test invalid requests never reach the generator.
#[tokio::test]
async fn test_invalid_request_rejected_before_generation() {
    let mut generator = MockGenerator::new();
    generator.expect_generate().times(0);
    let h = harness_with(Arc::new(generator));

    let mut bad = request();
    bad.num_replicas = 0;
    let err = h.controller.generate(bad).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidRequest(_)));
    assert!(err.is_client_error());
}

/// Test the request password wins over the configured one.
#[tokio::test]
async fn test_generate_passes_resolved_password() {
    let mut generator = MockGenerator::new();
    generator
        .expect_generate()
        .withf(|request, password, _| {
            request.num_replicas == 2 && password.expose() == "request-replication-pw"
        })
        .times(1)
        .returning(|_, _, targets| {
            Ok(GeneratedArtifacts {
                files: vec![targets.terraform_dir.join("main.tf")],
            })
        });
    let h = harness_with(Arc::new(generator));

    let mut req = request();
    req.replication_password = Some(Secret::new("request-replication-pw"));
    let ack = h.controller.generate(req).await.unwrap();

    assert_eq!(ack.files, vec![h.terraform_dir().join("main.tf")]);
    assert_eq!(ack.ansible_dir, h.root.path().join("ansible"));
}

/// Test controller construction rejects settings without an SSH key.
#[test]
fn test_controller_requires_ssh_key() {
    let root = tempfile::tempdir().unwrap();
    let mut settings = settings_in(root.path());
    settings.ssh_private_key = None;

    let result = ApplyController::new(
        settings,
        Arc::new(FakeExecutor::new()),
        Arc::new(MockGenerator::new()),
    );
    assert!(matches!(result, Err(CoreError::Settings(_))));
}
