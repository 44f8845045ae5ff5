//! # gantry_core
//!
//! The approval-gated apply workflow for Gantry.
//!
//! An [`ApplyController`] owns one workspace and walks it through
//! generate → plan → approve → apply → configure, refusing to apply
//! anything that was not approved and tracking the outcome so callers can
//! poll for status and drift.
//!
//! # Architecture
//!
//! - **Controller**: serializes workspace operations behind one lock
//! - **Session**: current plan, approval (scoped to a plan generation), outcome
//! - **Handle**: awaitable, abortable background apply
//! - **Status**: running / pending / drift-detected / completed / error
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use gantry_core::{ApplyController, ControllerSettings};
//! use gantry_iac::TerraformExecutor;
//! use gantry_runner::ProcessRunner;
//! use gantry_templates::TemplateGenerator;
//!
//! # async fn run() -> gantry_core::CoreResult<()> {
//! let settings = ControllerSettings::default().with_ssh_key("/etc/gantry/id_ed25519");
//! let executor = TerraformExecutor::new(Arc::new(ProcessRunner::default()), &settings.ansible_dir);
//! let controller = ApplyController::new(
//!     settings.clone(),
//!     Arc::new(executor),
//!     Arc::new(TemplateGenerator::new(&settings.template_dir)),
//! )?;
//!
//! controller.request_plan().await?;
//! if let Some(handle) = controller.submit_approval(true).handle() {
//!     let outcome = handle.wait().await;
//!     println!("apply {}", outcome.label());
//! }
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod error;
pub mod handle;
pub mod session;
pub mod settings;
pub mod status;

pub use controller::{ApplyController, ApprovalAck, GenerateAck};
pub use error::{CoreError, CoreResult};
pub use handle::ApplyHandle;
pub use session::{ApplyOutcome, ApplyOutput, PlanResult};
pub use settings::ControllerSettings;
pub use status::ApplyStatus;
