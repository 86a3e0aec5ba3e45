mod cli;
mod logging;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use crossseed_core::{
    load_config_with, validate_config, ConfigError, CrossSeedRunner, JackettSearcher,
    SanitizedConfig,
};

use cli::Cli;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match load_config_with(cli.config.as_deref(), cli.provider()) {
        Ok(config) => config,
        Err(e) => {
            logging::init_console("info");
            return Err(e).context("Failed to load configuration");
        }
    };

    if let Err(e) = logging::init(&config.logging.level, &config.logging.file) {
        logging::init_console(&config.logging.level);
        return Err(e);
    }

    validate_config(&config).context("Configuration validation failed")?;

    info!(
        "Configuration: {}",
        serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default()
    );

    let searcher = JackettSearcher::new(
        config.aggregator.clone(),
        Duration::from_secs(config.run.delay_secs),
    )
    .context("Failed to create Jackett client")?;

    searcher
        .probe()
        .await
        .map_err(|e| ConfigError::Unreachable {
            url: config.aggregator.url.clone(),
            reason: e.to_string(),
        })?;
    info!("Jackett reachable at {}", config.aggregator.url);

    let runner = CrossSeedRunner::from_config(&config, searcher)?;
    let summary = runner.run().await?;

    info!(
        "Done. {} releases, {} searched, {} matched, {} downloaded, {} skipped, {} failed",
        summary.releases,
        summary.searched,
        summary.matched,
        summary.downloaded,
        summary.skipped,
        summary.failed
    );

    Ok(())
}
