//! Reports for `--validate` and `--dry-run`
//!
//! Both reports are printed to stdout in the selected [`OutputFormat`].

use std::fmt::Write;

use anyhow::Result;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::labeling::{compile_name_rule, compile_template_rule, Compiled, METRIC_SUFFIX};

/// Result of `--validate`
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub metric: String,
    pub listen_address: String,
    pub metrics_path: String,
    pub endpoint: String,
    pub label_rules: usize,
    pub duplicate_label_keys: Vec<String>,
}

impl ValidationReport {
    /// Build a report for an already validated configuration
    pub fn new(config: &Config) -> Self {
        Self {
            valid: true,
            metric: format!("{}{}", config.exporter.namespace, METRIC_SUFFIX),
            listen_address: config.exporter.listen_address.clone(),
            metrics_path: config.exporter.metrics_path.clone(),
            endpoint: config.api.endpoint.clone(),
            label_rules: config.labels.len(),
            duplicate_label_keys: config.duplicate_label_keys(),
        }
    }

    /// Render in the requested format
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)? + "\n"),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(self)?),
            OutputFormat::Text => {
                let mut out = String::from("Configuration is valid\n");
                writeln!(out, "  metric:         {}", self.metric)?;
                writeln!(out, "  listen address: {}", self.listen_address)?;
                writeln!(out, "  metrics path:   {}", self.metrics_path)?;
                writeln!(out, "  endpoint:       {}", self.endpoint)?;
                writeln!(out, "  label rules:    {}", self.label_rules)?;
                if !self.duplicate_label_keys.is_empty() {
                    writeln!(
                        out,
                        "  duplicate label keys: {}",
                        self.duplicate_label_keys.join(", ")
                    )?;
                }
                Ok(out)
            }
        }
    }
}

/// Whether a rule survives compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    Ready,
    Dropped,
}

/// One rule in a dry-run report
#[derive(Debug, Serialize)]
pub struct RuleReport {
    pub label: String,
    /// Regex for name rules, field for template rules
    pub source: String,
    pub status: RuleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RuleReport {
    fn from_outcome<T>(label: &str, source: &str, outcome: Compiled<T>) -> Self {
        let (status, error) = match outcome {
            Compiled::Ready(_) => (RuleStatus::Ready, None),
            Compiled::Dropped(e) => (RuleStatus::Dropped, Some(e.to_string())),
        };
        Self {
            label: label.to_string(),
            source: source.to_string(),
            status,
            error,
        }
    }
}

/// Result of `--dry-run`
#[derive(Debug, Serialize)]
pub struct DryRunReport {
    pub metric: String,
    pub valid: usize,
    pub dropped: usize,
    pub vm_name_labels: Vec<RuleReport>,
    pub user_template_labels: Vec<RuleReport>,
}

impl DryRunReport {
    /// Compile every label rule of `config` and record the outcome
    pub fn new(config: &Config) -> Self {
        let vm_name_labels: Vec<RuleReport> = config
            .labels
            .labels_vm_name
            .iter()
            .map(|r| RuleReport::from_outcome(&r.name, &r.regexp, compile_name_rule(r)))
            .collect();

        let user_template_labels: Vec<RuleReport> = config
            .labels
            .labels_user_template
            .iter()
            .map(|r| RuleReport::from_outcome(&r.name, &r.field, compile_template_rule(r)))
            .collect();

        let dropped = vm_name_labels
            .iter()
            .chain(&user_template_labels)
            .filter(|r| r.status == RuleStatus::Dropped)
            .count();

        Self {
            metric: format!("{}{}", config.exporter.namespace, METRIC_SUFFIX),
            valid: vm_name_labels.len() + user_template_labels.len() - dropped,
            dropped,
            vm_name_labels,
            user_template_labels,
        }
    }

    /// Render in the requested format
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)? + "\n"),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(self)?),
            OutputFormat::Text => {
                let mut out = String::new();
                writeln!(out, "Metric: {}", self.metric)?;
                write_rules(&mut out, "VM name labels", &self.vm_name_labels)?;
                write_rules(&mut out, "User template labels", &self.user_template_labels)?;
                writeln!(
                    out,
                    "Dry run completed: {} valid, {} dropped",
                    self.valid, self.dropped
                )?;
                Ok(out)
            }
        }
    }
}

fn write_rules(out: &mut String, title: &str, rules: &[RuleReport]) -> std::fmt::Result {
    writeln!(out, "{}:", title)?;
    if rules.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for rule in rules {
        match &rule.error {
            None => writeln!(out, "  [ok]      {} <- {}", rule.label, rule.source)?,
            Some(e) => writeln!(out, "  [dropped] {} <- {}: {}", rule.label, rule.source, e)?,
        }
    }
    Ok(())
}
