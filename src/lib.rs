//! opennebula-exporter library
//!
//! This crate fetches the VM pool of an OpenNebula cloud and renders it in
//! the Prometheus text exposition format, with extra labels derived from
//! VM names and user template fields.

pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod inventory;
pub mod labeling;
pub mod report;
pub mod server;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use collector::{CollectResult, OneClient};
use config::Config;
use labeling::PoolRenderer;

/// Initialize the logging subsystem
///
/// Logs go to stderr so that `--write-stdout` output stays clean.
///
/// # Arguments
/// * `level` - Log level string (trace, debug, info, warn, error)
///
/// # Errors
/// Returns an error if the logging system fails to initialize
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Build the inventory client described by `config`
pub fn build_client(config: &Config) -> CollectResult<OneClient> {
    let mut client = OneClient::new(
        &config.api.endpoint,
        config.api.timeout_ms,
        config.api.insecure_ssl,
    )?;

    if let Some(ref user) = config.api.user {
        let password = config.api.password.as_deref().unwrap_or_default();
        client = client.with_auth(user, password);
    }

    Ok(client)
}

/// Fetch a fresh VM pool and render it
pub async fn scrape(client: &OneClient, renderer: &PoolRenderer) -> CollectResult<String> {
    let vms = client.fetch_pool().await?;
    Ok(renderer.render(&vms))
}
