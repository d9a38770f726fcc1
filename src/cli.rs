//! CLI argument parsing for opennebula-exporter
//!
//! This module provides the command-line interface using clap derive macros.
//!
//! # Options
//!
//! - `--config` / `-c`: Configuration file path (default: opennebula-exporter.yaml, env: ONE_EXPORTER_CONFIG)
//! - `--listen-address`: HTTP listen address (env: ONE_EXPORTER_LISTEN_ADDRESS)
//! - `--metrics-path`: Metrics endpoint path (env: ONE_EXPORTER_METRICS_PATH)
//! - `--namespace`: Metric name prefix (env: ONE_EXPORTER_NAMESPACE)
//! - `--endpoint`: VM pool endpoint URL (env: ONE_EXPORTER_ENDPOINT)
//! - `--user` / `--password`: API credentials (env: ONE_EXPORTER_USER, ONE_EXPORTER_PASSWORD)
//! - `--insecure-ssl`: Accept invalid TLS certificates from the API
//! - `--write-stdout`: Print metrics once and exit
//! - `--validate`: Validate configuration without starting
//! - `--dry-run`: Validate configuration and show compiled label rules
//! - `--log-level` / `-l`: Log level (trace/debug/info/warn/error, env: ONE_EXPORTER_LOG_LEVEL)
//! - `--output-format`: Output format for validate/dry-run (text/json/yaml)
//!
//! # Precedence
//!
//! Configuration values are resolved in the following order (highest to lowest priority):
//! 1. CLI arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// opennebula-exporter - Prometheus exporter for OpenNebula VMs
///
/// Fetches the VM pool from OpenNebula and exposes one presence line per
/// VM, labelled by regexes on the VM name and by user template fields.
#[derive(Parser, Debug)]
#[command(name = "opennebula-exporter")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "opennebula-exporter.yaml",
        env = "ONE_EXPORTER_CONFIG"
    )]
    pub config: PathBuf,

    /// HTTP listen address, e.g. 0.0.0.0:9621 (overrides config file)
    #[arg(long, value_name = "ADDRESS", env = "ONE_EXPORTER_LISTEN_ADDRESS")]
    pub listen_address: Option<String>,

    /// Metrics endpoint path (overrides config file)
    /// Must start with '/' and not conflict with '/' or '/health'
    #[arg(long, value_name = "PATH", env = "ONE_EXPORTER_METRICS_PATH")]
    pub metrics_path: Option<String>,

    /// Metric name prefix (overrides config file)
    #[arg(long, value_name = "NAMESPACE", env = "ONE_EXPORTER_NAMESPACE")]
    pub namespace: Option<String>,

    /// VM pool endpoint URL (overrides config file)
    #[arg(long, value_name = "URL", env = "ONE_EXPORTER_ENDPOINT")]
    pub endpoint: Option<String>,

    /// API username (overrides config file)
    #[arg(long, value_name = "USER", env = "ONE_EXPORTER_USER")]
    pub user: Option<String>,

    /// API password (overrides config file)
    #[arg(long, value_name = "PASSWORD", env = "ONE_EXPORTER_PASSWORD")]
    pub password: Option<String>,

    /// Accept invalid TLS certificates from the API
    #[arg(long)]
    pub insecure_ssl: bool,

    /// Print metrics to stdout once and exit
    #[arg(long)]
    pub write_stdout: bool,

    /// Validate configuration without starting
    #[arg(long)]
    pub validate: bool,

    /// Validate configuration and show compiled label rules
    #[arg(long)]
    pub dry_run: bool,

    /// Log level
    #[arg(
        short,
        long,
        value_enum,
        default_value = "info",
        env = "ONE_EXPORTER_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// Output format for --validate and --dry-run
    #[arg(long, value_enum, default_value = "text")]
    pub output_format: OutputFormat,
}

/// Log level options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level
    Debug,
    /// Info level - default
    Info,
    /// Warn level
    Warn,
    /// Error level - least verbose
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Output format options for validate and dry-run modes
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Trace.to_string(), "trace");
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert_eq!(LogLevel::Info.to_string(), "info");
        assert_eq!(LogLevel::Warn.to_string(), "warn");
        assert_eq!(LogLevel::Error.to_string(), "error");
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Text.to_string(), "text");
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Yaml.to_string(), "yaml");
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["opennebula-exporter"]);
        assert_eq!(cli.config, PathBuf::from("opennebula-exporter.yaml"));
        assert_eq!(cli.listen_address, None);
        assert_eq!(cli.metrics_path, None);
        assert_eq!(cli.namespace, None);
        assert_eq!(cli.endpoint, None);
        assert_eq!(cli.user, None);
        assert_eq!(cli.password, None);
        assert!(!cli.insecure_ssl);
        assert!(!cli.write_stdout);
        assert!(!cli.validate);
        assert!(!cli.dry_run);
        assert_eq!(cli.log_level, LogLevel::Info);
        assert_eq!(cli.output_format, OutputFormat::Text);
    }

    #[test]
    fn test_cli_with_options() {
        let cli = Cli::parse_from([
            "opennebula-exporter",
            "-c",
            "custom.yaml",
            "--listen-address",
            "127.0.0.1:9100",
            "--log-level",
            "debug",
            "--validate",
        ]);
        assert_eq!(cli.config, PathBuf::from("custom.yaml"));
        assert_eq!(cli.listen_address, Some("127.0.0.1:9100".to_string()));
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert!(cli.validate);
    }

    #[test]
    fn test_cli_dry_run() {
        let cli = Cli::parse_from(["opennebula-exporter", "--dry-run", "--output-format", "json"]);
        assert!(cli.dry_run);
        assert_eq!(cli.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_cli_write_stdout() {
        let cli = Cli::parse_from(["opennebula-exporter", "--write-stdout", "--insecure-ssl"]);
        assert!(cli.write_stdout);
        assert!(cli.insecure_ssl);
    }
}
