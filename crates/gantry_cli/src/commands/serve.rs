//! Serve command - Expose the workflow over HTTP.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::settings::SettingsArgs;
use crate::server;

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "GANTRY_BIND", default_value = "127.0.0.1:8000")]
    pub bind: String,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

pub async fn execute(args: ServeArgs) -> Result<()> {
    let controller = args.settings.controller()?;
    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    info!("Listening on {}", args.bind);

    axum::serve(listener, server::router(controller.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down; cancelling any running apply");
    controller.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
