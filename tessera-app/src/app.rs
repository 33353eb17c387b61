use crate::config::AppConfig;
use crate::logging;
use crate::setup::execution;
use anyhow::Result;
use clap::Parser;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Parses the command line, then loads, solves and saves.
pub fn main() -> Result<()> {
    let config = AppConfig::parse();
    logging::init_logger(&config);

    log::info!("Tessera starting");
    log::debug!("Loaded Config: {config:?}");

    let settings = config.settings()?;
    log::debug!("Solver settings: {settings:?}");

    let shutdown_signal = Arc::new(AtomicBool::new(false));
    execution::execute(&config, &settings, shutdown_signal)?;
    Ok(())
}
