//! Gantry CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or settings
//! - 3: Validation failure
//! - 4: Template error
//! - 5: IaC error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod server;

use commands::{Cli, Commands};
use gantry_core::CoreError;

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const TEMPLATE_ERROR: u8 = 4;
    pub const IAC_ERROR: u8 = 5;
}

const DEFAULT_LOG_FILTER: &str = "gantry=info,warn";

fn init_logging(json: bool, verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new(DEFAULT_LOG_FILTER)
        }
    });

    let registry = tracing_subscriber::registry().with(filter);
    let log_result = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };

    if log_result.is_err() {
        // Logging already initialized, continue
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_json, cli.verbose);

    let result = match cli.command {
        Commands::Generate(args) => commands::generate::execute(args).await,
        Commands::Plan(args) => commands::plan::execute(args).await,
        Commands::RenderInventory(args) => commands::render_inventory::execute(args).await,
        Commands::Serve(args) => commands::serve::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    if let Some(core) = e.downcast_ref::<CoreError>() {
        return match core {
            CoreError::InvalidRequest(_) => ExitCodes::VALIDATION_FAILURE,
            CoreError::Generation(_) => ExitCodes::TEMPLATE_ERROR,
            CoreError::Plan(_) | CoreError::DriftCheck(_) => ExitCodes::IAC_ERROR,
            CoreError::Settings(_) => ExitCodes::INVALID_ARGS,
            CoreError::Io(_) | CoreError::Serialization(_) => ExitCodes::GENERAL_ERROR,
        };
    }
    if e.downcast_ref::<gantry_iac::IacError>().is_some() {
        return ExitCodes::IAC_ERROR;
    }
    if e.downcast_ref::<gantry_spec::SpecError>().is_some() {
        return ExitCodes::VALIDATION_FAILURE;
    }
    ExitCodes::GENERAL_ERROR
}
