//! Configuration management for opennebula-exporter
//!
//! Handles loading and validating configuration from YAML files, and
//! applying command-line overrides on top of them.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Cli;
use crate::labeling::LabelRules;

/// Label keys every VM line carries before any rule labels
pub const BASE_LABELS: &[&str] = &["name", "id", "state", "lcm_state", "host"];

static METRIC_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_:][a-zA-Z0-9_:]*$").expect("invalid metric name regex"));

static LABEL_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("invalid label name regex"));

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error reading the configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing the configuration file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Exporter output configuration
    #[serde(default)]
    pub exporter: ExporterConfig,

    /// Inventory API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Label rules (`labels_vm_name`, `labels_user_template`)
    #[serde(flatten)]
    pub labels: LabelRules,
}

/// Exporter output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Metric name prefix
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// HTTP listen address (`host:port`)
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Metrics endpoint path
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,

    /// Print metrics once to stdout and exit instead of serving
    #[serde(default)]
    pub write_stdout: bool,
}

/// Inventory API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Optional username for basic auth
    pub user: Option<String>,

    /// Optional password for basic auth
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// VM pool endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Accept invalid TLS certificates
    #[serde(default)]
    pub insecure_ssl: bool,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

// Default value functions
fn default_namespace() -> String {
    "opennebula".to_string()
}

fn default_listen_address() -> String {
    "0.0.0.0:9621".to_string()
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_endpoint() -> String {
    "http://localhost:2633/vmpool".to_string()
}

fn default_timeout() -> u64 {
    5000
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            listen_address: default_listen_address(),
            metrics_path: default_metrics_path(),
            write_stdout: false,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            user: None,
            password: None,
            endpoint: default_endpoint(),
            insecure_ssl: false,
            timeout_ms: default_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// Parses the file but does not validate it; call [`Config::validate`]
    /// after applying overrides.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    /// Load configuration from a YAML file, falling back to defaults if not found
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        Self::load(path)
    }

    /// Apply command-line overrides
    ///
    /// clap has already folded environment variables into `cli`, so the
    /// resulting precedence is CLI > env > file > default.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(ref namespace) = cli.namespace {
            self.exporter.namespace = namespace.clone();
        }
        if let Some(ref listen_address) = cli.listen_address {
            self.exporter.listen_address = listen_address.clone();
        }
        if let Some(ref metrics_path) = cli.metrics_path {
            self.exporter.metrics_path = metrics_path.clone();
        }
        if cli.write_stdout {
            self.exporter.write_stdout = true;
        }
        if let Some(ref endpoint) = cli.endpoint {
            self.api.endpoint = endpoint.clone();
        }
        if let Some(ref user) = cli.user {
            self.api.user = Some(user.clone());
        }
        if let Some(ref password) = cli.password {
            self.api.password = Some(password.clone());
        }
        if cli.insecure_ssl {
            self.api.insecure_ssl = true;
        }
    }

    /// Resolve the listen address to a socket address
    ///
    /// Accepts `ip:port`, `localhost:port` and `:port` (all interfaces).
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = self.exporter.listen_address.trim();
        let invalid = |reason: String| {
            ConfigError::ValidationError(format!("Invalid listen_address '{}': {}", addr, reason))
        };

        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| invalid("expected host:port".to_string()))?;
        let port: u16 = port.parse().map_err(|e| invalid(format!("{}", e)))?;
        if port == 0 {
            return Err(invalid("port must be greater than 0".to_string()));
        }

        let ip = match host {
            "" => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            "localhost" => IpAddr::V4(Ipv4Addr::LOCALHOST),
            other => other
                .trim_start_matches('[')
                .trim_end_matches(']')
                .parse()
                .map_err(|e| invalid(format!("{}", e)))?,
        };

        Ok(SocketAddr::new(ip, port))
    }

    /// Label keys used more than once, including collisions with base labels
    pub fn duplicate_label_keys(&self) -> Vec<String> {
        let mut seen: HashSet<&str> = BASE_LABELS.iter().copied().collect();
        let mut duplicates = Vec::new();

        for name in self.labels.label_names() {
            if !seen.insert(name) && !duplicates.iter().any(|d| d == name) {
                duplicates.push(name.to_string());
            }
        }

        duplicates
    }

    /// Validate the configuration
    ///
    /// Invalid regex patterns are not rejected here: they are dropped per
    /// render pass so that metrics stay available.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !METRIC_NAME_RE.is_match(&self.exporter.namespace) {
            return Err(ConfigError::ValidationError(format!(
                "Namespace '{}' is not a valid metric name prefix",
                self.exporter.namespace
            )));
        }

        self.socket_addr()?;

        let path = &self.exporter.metrics_path;
        if !path.starts_with('/') {
            return Err(ConfigError::ValidationError(
                "Metrics path must start with '/'".to_string(),
            ));
        }
        if path == "/" || path == "/health" {
            return Err(ConfigError::ValidationError(format!(
                "Metrics path '{}' conflicts with a built-in route",
                path
            )));
        }

        match url::Url::parse(&self.api.endpoint) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => {
                return Err(ConfigError::ValidationError(format!(
                    "API endpoint must use http or https, got '{}'",
                    url.scheme()
                )))
            }
            Err(e) => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid API endpoint '{}': {}",
                    self.api.endpoint, e
                )))
            }
        }

        if self.api.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "API timeout must be greater than 0".to_string(),
            ));
        }

        for name in self.labels.label_names() {
            if !LABEL_NAME_RE.is_match(name) {
                return Err(ConfigError::ValidationError(format!(
                    "Label name '{}' is not a valid Prometheus label name",
                    name
                )));
            }
        }

        for rule in &self.labels.labels_user_template {
            if rule.field.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "User template label '{}' has an empty field",
                    rule.name
                )));
            }
        }

        for key in self.duplicate_label_keys() {
            tracing::warn!(label = %key, "Label key emitted more than once per line");
        }

        Ok(())
    }
}
