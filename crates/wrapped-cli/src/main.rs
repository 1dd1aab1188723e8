//! Main entry point for yt-wrapped.

use anyhow::Context;
use clap::Parser;
use std::io::Write;
use tracing::debug;
use wrapped_cli::{run, Cli};
use wrapped_common::init_logging;
use wrapped_config::ConfigLoader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // Held until exit so buffered file logs are flushed.
    let _guard = init_logging(&config.logging.to_logging_config().with_verbosity(cli.verbose))
        .context("Failed to initialize logging")?;
    debug!(?cli, "Starting yt-wrapped");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(cli.command, &config, &mut out).await?;
    out.flush().context("Failed to flush output")?;
    Ok(())
}
