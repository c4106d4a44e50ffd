//! audittrail-export - Audit Trail CSV Export Tool
//!
//! Exports audit trail events matching the given filters to a CSV file
use audittrail_export::{ExportConfig, Result, cli, config, run_export};
use clap::Parser;
use log::info;
use std::path::Path;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Environment defaults must be in place before clap reads env fallbacks
    config::load_env_file(Path::new(config::ENV_FILE));

    let args = cli::Cli::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(args: cli::Cli) -> Result<()> {
    let config = ExportConfig::from_cli(args)?;
    config.log_summary();

    let summary = run_export(config).await?;
    info!("Success! Audit trail saved to: {}", summary.path.display());

    Ok(())
}
