// File: rotator/src/main.rs
use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use rotator::cli::{usage_exit_code, Cli};
use rotator::constants::{defaults, exit};
use rotator::errors::exit_code_for;
use rotator::{BackupOrchestrator, Cadence, ConfigManager, HttpCloudClient};

fn init_logging() -> Result<()> {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("rotator=info".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    fmt().with_env_filter(env_filter).init();
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::from(exit::UNEXPECTED);
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match usage_exit_code(&e) {
            Some(code) => {
                error!("You must select a single backup type: {}", e);
                return ExitCode::from(code);
            }
            None => e.exit(),
        },
    };

    let Some(cadence) = cli.cadence() else {
        error!("You must select a single backup type");
        return ExitCode::from(exit::FATAL);
    };

    match run(cadence).await {
        Ok(()) => ExitCode::from(exit::SUCCESS),
        Err(e) => {
            error!("Backup run aborted: {:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

async fn run(cadence: Cadence) -> Result<()> {
    let config_dir =
        std::env::var(defaults::CONFIG_DIR_ENV).unwrap_or_else(|_| defaults::CONFIG_DIR.to_string());

    let config_manager = ConfigManager::new(&config_dir).await?;
    let config = config_manager.get_current_config();

    let client = HttpCloudClient::connect(&config).await?;
    let orchestrator = BackupOrchestrator::new(config.clone(), Arc::new(client));

    let result = orchestrator.run(cadence).await?;
    if !result.is_clean() {
        info!(
            "Run {} completed with {} skipped instances and {} failed operations, see errors above",
            result.run_id, result.instances_skipped, result.failed_operations
        );
    }

    Ok(())
}
