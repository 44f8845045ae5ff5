//! CLI command definitions.
//!
//! One-shot commands drive a single workflow step; `serve` exposes the
//! whole plan/approve/apply cycle over HTTP.

use clap::{Parser, Subcommand};

pub mod generate;
pub mod plan;
pub mod render_inventory;
pub mod serve;
pub mod settings;

/// Gantry - approval-gated provisioning for PostgreSQL clusters
#[derive(Parser)]
#[command(name = "gantry")]
#[command(version, about = "Gantry - approval-gated provisioning for PostgreSQL clusters")]
#[command(long_about = r#"
Gantry renders Terraform and Ansible artifacts for a PostgreSQL primary with
streaming replicas, then drives plan -> approval -> apply -> configure.

WORKFLOWS:
  generate          -> Render Terraform and Ansible artifacts from a request
  plan              -> Run terraform plan against the workspace
  render-inventory  -> Build an Ansible inventory from terraform outputs
  serve             -> HTTP API for the full approval-gated workflow

CONFIGURATION:
  Settings come from --config (YAML) and are overridden by flags or
  GANTRY_* environment variables. The SSH private key is required and the
  replication password is read from GANTRY_REPLICATION_PASSWORD when a
  request does not carry one.

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or settings
  3 - Validation failure
  4 - Template error
  5 - IaC error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "GANTRY_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render artifacts from a provisioning request
    Generate(generate::GenerateArgs),

    /// Plan the rendered workspace
    Plan(plan::PlanArgs),

    /// Render inventory.ini from `terraform output -json`
    #[command(name = "render-inventory")]
    RenderInventory(render_inventory::RenderInventoryArgs),

    /// Serve the workflow over HTTP
    Serve(serve::ServeArgs),
}
