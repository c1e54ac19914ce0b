//! zeq-inspect binary entry point.
//!
//! This is a thin wrapper around the zeq-inspect library that:
//! 1. Parses command-line arguments
//! 2. Initializes logging
//! 3. Validates configuration
//! 4. Runs the command
//!
//! For library usage, see the zeq-inspect crate documentation.

use anyhow::Result;
use zeq_inspect::{InspectConfig, commands};

fn main() -> Result<()> {
    // Parse configuration from CLI args
    let config = InspectConfig::from_args();

    // Initialize tracing subscriber for logging; RUST_LOG wins over --log-level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Configuration loaded: {:?}", config.command);

    // Validate configuration
    config.validate()?;

    commands::run(&config, &mut std::io::stdout().lock())?;

    Ok(())
}
