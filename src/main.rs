//! opennebula-exporter - Prometheus exporter for OpenNebula VMs
//!
//! Serves the rendered VM pool on a metrics endpoint, or prints it once to
//! stdout with `--write-stdout`.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use opennebula_exporter::cli::Cli;
use opennebula_exporter::config::Config;
use opennebula_exporter::labeling::PoolRenderer;
use opennebula_exporter::report::{DryRunReport, ValidationReport};
use opennebula_exporter::server;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    opennebula_exporter::init_logging(&cli.log_level.to_string())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting opennebula-exporter"
    );

    // Load configuration; CLI and env values win over the file
    let mut config = Config::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    config.apply_cli(&cli);
    config.validate()?;

    if cli.validate {
        print!("{}", ValidationReport::new(&config).render(cli.output_format)?);
        return Ok(());
    }

    if cli.dry_run {
        print!("{}", DryRunReport::new(&config).render(cli.output_format)?);
        return Ok(());
    }

    if config.exporter.write_stdout {
        return write_stdout(config).await;
    }

    server::run(config).await
}

/// Render the pool once to stdout; any fetch error is fatal
async fn write_stdout(config: Config) -> Result<()> {
    let client = opennebula_exporter::build_client(&config)?;
    let renderer = PoolRenderer::new(
        config.exporter.namespace.clone(),
        Arc::new(config.labels.clone()),
    );

    let output = match opennebula_exporter::scrape(&client, &renderer).await {
        Ok(output) => output,
        Err(e) => {
            error!(endpoint = %client.endpoint(), error = %e, "Failed to fetch VM pool");
            return Err(e.into());
        }
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
