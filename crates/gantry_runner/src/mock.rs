//! Mock tool runner for testing.
//!
//! Provides a configurable mock implementation of the ToolRunner trait
//! for use in unit tests without terraform or ansible installed.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::config::{RunConfig, ToolCommand};
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{ExecutionResult, ToolRunner};

/// Predefined mock response for a tool execution.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl MockResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            duration_ms: 0,
        }
    }

    pub fn failure(exit_code: i64, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            duration_ms: 0,
        }
    }

    /// Response with an explicit exit code and stdout, e.g. exit 2 from
    /// `terraform plan -detailed-exitcode`.
    pub fn exit(exit_code: i64, stdout: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: String::new(),
            duration_ms: 0,
        }
    }

    /// Make the mock actually wait this long before answering.
    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub method: String,
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub workdir: Option<PathBuf>,
}

impl CapturedCall {
    /// First argument, which is the subcommand for terraform.
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(|s| s.as_str())
    }
}

#[derive(Debug, Clone)]
struct ResponseRule {
    program: String,
    subcommand: Option<String>,
    response: MockResponse,
}

/// Mock tool runner for testing.
///
/// Responses are chosen by the first matching rule (program and optional
/// subcommand), then from the sequential response list, then an empty
/// success.
#[derive(Clone)]
pub struct MockRunner {
    /// Programs that report as available.
    available: Arc<RwLock<Vec<String>>>,
    /// Rules matched against program and subcommand.
    rules: Arc<RwLock<Vec<ResponseRule>>>,
    /// Predefined responses for unmatched run calls.
    responses: Arc<RwLock<Vec<MockResponse>>>,
    /// Index of next response to return.
    response_index: Arc<AtomicUsize>,
    /// Captured calls for verification.
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    /// Simulated failure to return.
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRunner {
    /// Create a new mock runner.
    pub fn new() -> Self {
        Self {
            available: Arc::new(RwLock::new(vec![
                "terraform".to_string(),
                "ansible-playbook".to_string(),
            ])),
            rules: Arc::new(RwLock::new(Vec::new())),
            responses: Arc::new(RwLock::new(Vec::new())),
            response_index: Arc::new(AtomicUsize::new(0)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            simulate_failure: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the programs that report as available.
    pub fn set_available(self, programs: &[&str]) -> Self {
        *self.available.write() = programs.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Answer every call to `program` with `response`.
    pub fn on_program(self, program: impl Into<String>, response: MockResponse) -> Self {
        self.rules.write().push(ResponseRule {
            program: program.into(),
            subcommand: None,
            response,
        });
        self
    }

    /// Answer calls to `program <subcommand> ...` with `response`.
    pub fn on(
        self,
        program: impl Into<String>,
        subcommand: impl Into<String>,
        response: MockResponse,
    ) -> Self {
        self.rules.write().push(ResponseRule {
            program: program.into(),
            subcommand: Some(subcommand.into()),
            response,
        });
        self
    }

    /// Replace the rule for `program <subcommand>` at runtime.
    pub fn set_rule(&self, program: &str, subcommand: &str, response: MockResponse) {
        let mut rules = self.rules.write();
        rules.retain(|r| !(r.program == program && r.subcommand.as_deref() == Some(subcommand)));
        rules.push(ResponseRule {
            program: program.to_string(),
            subcommand: Some(subcommand.to_string()),
            response,
        });
    }

    /// Add a mock response for the next unmatched call.
    pub fn add_response(self, response: MockResponse) -> Self {
        self.responses.write().push(response);
        self
    }

    /// Set multiple responses.
    pub fn with_responses(self, responses: Vec<MockResponse>) -> Self {
        *self.responses.write() = responses;
        self
    }

    /// Set a failure to simulate.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    /// Clear all captured calls.
    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Get run calls for a given program and subcommand.
    pub fn calls_to(&self, program: &str, subcommand: &str) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.method == "run" && c.program == program)
            .filter(|c| c.subcommand() == Some(subcommand))
            .cloned()
            .collect()
    }

    /// Ordered list of `program subcommand` strings that were run.
    pub fn run_sequence(&self) -> Vec<String> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.method == "run")
            .map(|c| match c.subcommand() {
                Some(sub) => format!("{} {}", c.program, sub),
                None => c.program.clone(),
            })
            .collect()
    }

    fn record_call(&self, call: CapturedCall) {
        self.captured_calls.write().push(call);
    }

    fn next_response(&self, command: &ToolCommand) -> MockResponse {
        let subcommand = command.args.first().map(|s| s.as_str());
        let matched = self
            .rules
            .read()
            .iter()
            .rev()
            .find(|r| {
                r.program == command.program
                    && (r.subcommand.is_none() || r.subcommand.as_deref() == subcommand)
            })
            .map(|r| r.response.clone());
        if let Some(response) = matched {
            return response;
        }

        let responses = self.responses.read();
        if responses.is_empty() {
            return MockResponse::success("");
        }
        let index = self.response_index.fetch_add(1, Ordering::SeqCst);
        responses
            .get(index % responses.len())
            .cloned()
            .unwrap_or_else(|| MockResponse::success(""))
    }

    fn check_failure(&self) -> RunnerResult<()> {
        if let Some(msg) = self.simulate_failure.read().clone() {
            return Err(RunnerError::ExecutionFailed(msg));
        }
        Ok(())
    }
}

#[async_trait]
impl ToolRunner for MockRunner {
    async fn is_available(&self, program: &str) -> RunnerResult<bool> {
        self.record_call(CapturedCall {
            method: "is_available".to_string(),
            program: program.to_string(),
            args: Vec::new(),
            env: BTreeMap::new(),
            workdir: None,
        });
        Ok(self.available.read().iter().any(|p| p == program))
    }

    async fn run(
        &self,
        command: &ToolCommand,
        _run_config: &RunConfig,
    ) -> RunnerResult<ExecutionResult> {
        self.record_call(CapturedCall {
            method: "run".to_string(),
            program: command.program.clone(),
            args: command.args.clone(),
            env: command.env.clone(),
            workdir: command.workdir.clone(),
        });

        self.check_failure()?;

        let response = self.next_response(command);
        let started_at = Utc::now();
        if response.duration_ms > 0 {
            tokio::time::sleep(Duration::from_millis(response.duration_ms)).await;
        }
        let finished_at = Utc::now();

        Ok(ExecutionResult {
            execution_id: format!("mock-{}", uuid::Uuid::new_v4()),
            program: command.program.clone(),
            exit_code: response.exit_code,
            stdout: response.stdout,
            stderr: response.stderr,
            started_at,
            finished_at,
            duration_ms: response.duration_ms,
        })
    }
}
