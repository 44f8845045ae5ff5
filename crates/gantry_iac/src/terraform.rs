//! Terraform command runner.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use gantry_runner::{CommonTools, ExecutionResult, RunConfig, ToolRunner};

use crate::error::{IacError, IacResult};
use crate::outputs::{parse_outputs, TerraformOutputs};
use crate::plan::{DriftProbe, PlanOutput, PLAN_FILE};

/// Result of a Terraform operation.
#[derive(Debug)]
pub struct TerraformResult {
    pub success: bool,
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
}

impl From<ExecutionResult> for TerraformResult {
    fn from(result: ExecutionResult) -> Self {
        Self {
            success: result.success(),
            exit_code: result.exit_code,
            stdout: result.stdout,
            stderr: result.stderr,
        }
    }
}

impl TerraformResult {
    /// Turn a non-zero exit into an execution error.
    fn require_success(self, subcommand: &str) -> IacResult<Self> {
        if self.success {
            return Ok(self);
        }
        Err(self.into_error(subcommand))
    }

    fn into_error(self, subcommand: &str) -> IacError {
        IacError::Execution {
            tool: format!("terraform {}", subcommand),
            exit_code: self.exit_code,
            stderr: if self.stderr.trim().is_empty() {
                self.stdout
            } else {
                self.stderr
            },
        }
    }
}

/// Runs terraform subcommands inside a workspace directory.
pub struct TerraformRunner {
    runner: Arc<dyn ToolRunner>,
    run_config: RunConfig,
}

impl TerraformRunner {
    /// Create a new Terraform runner.
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            runner,
            run_config: RunConfig::default(),
        }
    }

    /// Bound every terraform call by `seconds` (0 disables the limit).
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.run_config = self.run_config.timeout(seconds);
        self
    }

    pub fn plan_file(working_dir: &Path) -> PathBuf {
        working_dir.join(PLAN_FILE)
    }

    fn ensure_workspace(working_dir: &Path) -> IacResult<()> {
        if !working_dir.is_dir() {
            return Err(IacError::WorkspaceMissing(working_dir.to_path_buf()));
        }
        Ok(())
    }

    /// Run terraform init unless the workspace is already initialized.
    pub async fn init_if_needed(&self, working_dir: &Path) -> IacResult<()> {
        if working_dir.join(".terraform").is_dir() {
            debug!("Workspace {:?} already initialized", working_dir);
            return Ok(());
        }
        info!("Running terraform init in {:?}", working_dir);
        self.run_command(working_dir, &["init", "-input=false", "-no-color"])
            .await?
            .require_success("init")?;
        Ok(())
    }

    /// Run terraform plan, saving the plan file, and render it as JSON.
    ///
    /// Any plan file left by an earlier run is removed first, so a failed
    /// plan never leaves an older plan behind to be applied.
    pub async fn plan(&self, working_dir: &Path) -> IacResult<PlanOutput> {
        Self::ensure_workspace(working_dir)?;
        let plan_file = Self::plan_file(working_dir);
        if plan_file.exists() {
            debug!("Removing stale plan file {:?}", plan_file);
            std::fs::remove_file(&plan_file)?;
        }
        self.init_if_needed(working_dir).await?;

        info!("Running terraform plan in {:?}", working_dir);
        let out_arg = format!("-out={}", PLAN_FILE);
        self.run_command(working_dir, &["plan", "-input=false", "-no-color", &out_arg])
            .await?
            .require_success("plan")?;

        let show = self
            .run_command(working_dir, &["show", "-json", PLAN_FILE])
            .await?
            .require_success("show")?;

        let plan = PlanOutput::from_show_json(Self::plan_file(working_dir), &show.stdout)?;
        info!("Plan ready: {}", plan.summary);
        Ok(plan)
    }

    /// Compare live infrastructure with the configuration.
    pub async fn detect_drift(&self, working_dir: &Path) -> IacResult<DriftProbe> {
        Self::ensure_workspace(working_dir)?;
        debug!("Probing for drift in {:?}", working_dir);

        let result = self
            .run_command(
                working_dir,
                &["plan", "-detailed-exitcode", "-input=false", "-no-color", "-lock=true"],
            )
            .await?;

        match result.exit_code {
            0 => Ok(DriftProbe::InSync),
            2 => Ok(DriftProbe::Drifted {
                diff: result.stdout,
            }),
            _ => Err(result.into_error("plan")),
        }
    }

    /// Apply the saved plan file, then remove it.
    pub async fn apply(&self, working_dir: &Path) -> IacResult<String> {
        Self::ensure_workspace(working_dir)?;
        let plan_file = Self::plan_file(working_dir);
        if !plan_file.is_file() {
            return Err(IacError::PlanMissing(plan_file));
        }

        info!("Running terraform apply in {:?}", working_dir);
        let result = self
            .run_command(working_dir, &["apply", "-input=false", "-no-color", PLAN_FILE])
            .await?
            .require_success("apply")?;

        // A saved plan is stale once applied
        std::fs::remove_file(&plan_file)?;
        Ok(result.stdout)
    }

    /// Read all outputs of the workspace.
    pub async fn output(&self, working_dir: &Path) -> IacResult<TerraformOutputs> {
        Self::ensure_workspace(working_dir)?;
        let result = self
            .run_command(working_dir, &["output", "-json"])
            .await?
            .require_success("output")?;
        parse_outputs(&result.stdout)
    }

    async fn run_command(&self, working_dir: &Path, args: &[&str]) -> IacResult<TerraformResult> {
        let command = CommonTools::terraform(working_dir).args(args.iter().copied());
        debug!("Executing terraform {:?}", args);
        let result = self.runner.run(&command, &self.run_config).await?;
        Ok(result.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_runner::{MockResponse, MockRunner};

    #[tokio::test]
    async fn test_init_skipped_when_initialized() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".terraform")).unwrap();
        let mock = MockRunner::new();
        let terraform = TerraformRunner::new(Arc::new(mock.clone()));

        terraform.init_if_needed(dir.path()).await.unwrap();
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_command_prefers_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockRunner::new().on("terraform", "output", MockResponse::failure(1, "no state"));
        let terraform = TerraformRunner::new(Arc::new(mock));

        match terraform.output(dir.path()).await {
            Err(IacError::Execution {
                tool,
                exit_code,
                stderr,
            }) => {
                assert_eq!(tool, "terraform output");
                assert_eq!(exit_code, 1);
                assert_eq!(stderr, "no state");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_drift_unexpected_exit_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockRunner::new().on("terraform", "plan", MockResponse::failure(1, "auth"));
        let terraform = TerraformRunner::new(Arc::new(mock));

        let err = terraform.detect_drift(dir.path()).await.unwrap_err();
        assert_eq!(err.kind(), "tool-failed");
    }
}
