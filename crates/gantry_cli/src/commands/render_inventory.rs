//! Render-inventory command - Build inventory.ini from terraform outputs.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use gantry_iac::{parse_outputs, Inventory, NodeAddresses};

use super::settings::SettingsArgs;

#[derive(Args)]
pub struct RenderInventoryArgs {
    /// File holding the output of `terraform output -json`
    #[arg(short, long)]
    outputs: PathBuf,

    /// Write inventory.ini into the configured ansible directory instead of stdout
    #[arg(long)]
    write: bool,

    #[command(flatten)]
    settings: SettingsArgs,
}

pub async fn execute(args: RenderInventoryArgs) -> Result<()> {
    let settings = args.settings.resolve()?;
    let ssh = settings.ssh_settings()?;

    let content = std::fs::read_to_string(&args.outputs)
        .with_context(|| format!("Failed to read {}", args.outputs.display()))?;
    let outputs = parse_outputs(&content)?;
    let nodes = NodeAddresses::from_outputs(&outputs)?;
    let inventory = Inventory::new(nodes, ssh);

    if args.write {
        let path = inventory.write_to(&settings.ansible_dir)?;
        info!("Wrote {:?}", path);
        println!("{}", path.display());
    } else {
        print!("{}", inventory.render());
    }
    Ok(())
}
