//! Strata Inspect - Main entry point
//!
//! Usage:
//!   strata-inspect route <table> [key]
//!   strata-inspect select <table> [--key key] [field=value ...]

use anyhow::Context;
use clap::Parser;
use strata_core::StrataConfig;
use strata_inspect::{Cli, Inspector};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from environment
    let config = StrataConfig::from_env();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let command = cli.command;
    info!(?command, force_master = config.force_master, "Inspecting");

    let inspector = Inspector::from_config(config).context("failed to load schema")?;
    let report = inspector.run(&command)?;
    println!("{}", report);

    Ok(())
}
