//! SnipFix CLI
//!
//! Trims a video between two frames at the closest keyframes, keeping every
//! named audio stream, and writes the loud, merged and compressed results.
//!
//! # Usage
//!
//! ```bash
//! snipfix streams --input recording.mp4
//! snipfix trim --input recording.mp4 --start-frame 60 --end-frame 600 --out-dir clips
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use snipfix::adapters::TracingLogAdapter;
use snipfix::cli::{commands, Cli, Commands};
use snipfix::config_initialization::initialize_configuration_hierarchy;

/// Main entry point for the SnipFix CLI application
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let config = initialize_configuration_hierarchy(cli.config.as_deref(), &cli.config_overrides())
        .context("Failed to load configuration")?;

    // Initialize logging
    TracingLogAdapter::init(&config.log_level, config.json_logs)?;
    info!("Starting SnipFix");

    // Execute the requested command
    match cli.command {
        Commands::Streams(args) => {
            info!("Executing streams command");
            commands::streams(args)?;
        }
        Commands::Trim(args) => {
            info!("Executing trim command");
            commands::trim(args, config).await?;
        }
    }

    info!("SnipFix completed successfully");
    Ok(())
}
