//! # gantry_runner
//!
//! External tool execution for Gantry.
//!
//! Every infrastructure-changing step (terraform plan/apply/output and the
//! ansible-playbook run) goes through the [`ToolRunner`] trait so the
//! workflow can be exercised without the real tools installed.
//!
//! # Features
//!
//! - **Process Runner**: spawns tools locally with output capture and timeouts
//! - **Dry-Run Mode**: log commands without executing them
//! - **Mock Runner**: scripted responses and call capture for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use gantry_runner::{CommonTools, ProcessRunner, ProcessRunnerOptions, RunConfig, ToolRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = ProcessRunner::new(ProcessRunnerOptions::default());
//!
//!     let plan = CommonTools::terraform("./workspace/terraform")
//!         .args(["plan", "-input=false", "-no-color"]);
//!
//!     let result = runner.run(&plan, &RunConfig::default().timeout(600)).await?;
//!     println!("Exit code: {}", result.exit_code);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod mock;
pub mod process;
pub mod runner;

pub use config::{CommonTools, RunConfig, ToolCommand};
pub use error::{RunnerError, RunnerResult};
pub use mock::{CapturedCall, MockResponse, MockRunner};
pub use process::{LogHandler, LogLine, LogStream, ProcessRunner, ProcessRunnerOptions};
pub use runner::{ExecutionResult, ToolRunner};
