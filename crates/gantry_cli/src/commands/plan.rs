//! Plan command - Run terraform plan against the workspace.

use anyhow::Result;
use clap::Args;

use super::settings::SettingsArgs;

#[derive(Args)]
pub struct PlanArgs {
    /// Print the full JSON plan instead of a summary
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    settings: SettingsArgs,
}

pub async fn execute(args: PlanArgs) -> Result<()> {
    let controller = args.settings.controller()?;
    let plan = controller.request_plan().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan.raw)?);
        return Ok(());
    }

    println!("Plan saved to {}", plan.plan_file.display());
    println!("  {}", plan.summary);
    if !plan.summary.has_changes() {
        println!("  No changes. Infrastructure matches the configuration.");
    }
    Ok(())
}
