//! Generate command - Render artifacts from a provisioning request.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use gantry_spec::ProvisioningRequest;

use super::settings::SettingsArgs;

#[derive(Args)]
pub struct GenerateArgs {
    /// Provisioning request file (YAML or JSON)
    #[arg(short, long)]
    request: PathBuf,

    #[command(flatten)]
    settings: SettingsArgs,
}

pub async fn execute(args: GenerateArgs) -> Result<()> {
    info!("Loading request from {:?}", args.request);
    let request = ProvisioningRequest::from_file(&args.request)
        .with_context(|| format!("Failed to load request {}", args.request.display()))?;

    let controller = args.settings.controller()?;
    let ack = controller.generate(request).await?;

    for warning in &ack.warnings {
        println!("warning: {}", warning);
    }
    println!("Generated {} files:", ack.files.len());
    for file in &ack.files {
        println!("  {}", file.display());
    }
    println!("Terraform workspace: {}", ack.terraform_dir.display());
    println!("Ansible directory:   {}", ack.ansible_dir.display());

    Ok(())
}
