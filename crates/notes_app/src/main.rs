mod cli;
mod config;
mod logging;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use notes_engine::{Pipeline, RunReport};
use notes_logging::{notes_error, notes_info};

use crate::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::initialize(cli.log_destination(), cli.log_level());

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            notes_error!("{:#}", err);
            eprintln!("notes2md: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let settings = config::resolve_settings(cli)?;
    notes_info!(
        "Processing {:?} with {} (up to {} at a time)",
        settings.root,
        settings.converter.program,
        settings.max_concurrency
    );

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let pipeline = Pipeline::with_command_converter(settings);
    let report = runtime.block_on(pipeline.run())?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", summary_line(&report));
    }
    Ok(())
}

fn summary_line(report: &RunReport) -> String {
    format!(
        "converted {}, failed {}, skipped {}",
        report.converted,
        report.failed,
        report.skipped_existing + report.skipped_conflicts + report.skipped_duplicates
    )
}
