mod cli;
mod config;
mod error;
mod logging;
mod progress;

use crate::cli::Cli;
use crate::config::PartialConversionConfig;
use crate::error::Result;
use crate::progress::CliProgressHandler;
use clap::Parser;
use tracing::{debug, info};
use xtal::engine::progress::ProgressReporter;
use xtal::workflows;

fn main() {
    if let Err(e) = run_app() {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.log_file.as_deref())?;

    info!("map2sf v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let partial_config = match &cli.config {
        Some(path) => PartialConversionConfig::from_file(path)?,
        None => PartialConversionConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&cli)?;

    let progress_handler = CliProgressHandler::new(cli.verbose > 0);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let summary = workflows::map2sf::run(&config, &reporter)?;
    info!(
        "Wrote {} reflection(s) with columns {} to {:?}",
        summary.reflections,
        summary.columns.join(" "),
        &config.output_path
    );

    Ok(())
}
