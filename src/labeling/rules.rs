//! Label rule definitions and the rule compiler
//!
//! Two kinds of rules derive extra labels for a VM line:
//!
//! - [`VmNameRegexLabel`] matches a regex against the VM name
//! - [`UserTemplateLabel`] reads a field from the VM's user template
//!
//! # Example Configuration (YAML)
//!
//! ```yaml
//! labels_vm_name:
//!   - name: shard
//!     regexp: "staging-(\\w+)-\\d+"
//! labels_user_template:
//!   - name: owner
//!     field: OWNER
//! ```
//!
//! [`compile`] turns a [`LabelRules`] into [`CompiledRules`] once per render
//! pass. Rules that cannot be compiled are dropped with a warning and never
//! abort the pass.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::RuleError;

/// Label derived from a regex match against the VM name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmNameRegexLabel {
    /// Output label key
    pub name: String,

    /// Regex matched against the VM name
    #[serde(alias = "pattern")]
    pub regexp: String,
}

impl VmNameRegexLabel {
    pub fn new(name: impl Into<String>, regexp: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            regexp: regexp.into(),
        }
    }
}

/// Label read from a field of the VM user template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTemplateLabel {
    /// Output label key
    pub name: String,

    /// User template field to read
    pub field: String,
}

impl UserTemplateLabel {
    pub fn new(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
        }
    }
}

/// Label rule configuration, in configuration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRules {
    /// Name-regex rules
    #[serde(default)]
    pub labels_vm_name: Vec<VmNameRegexLabel>,

    /// Template-field rules
    #[serde(default)]
    pub labels_user_template: Vec<UserTemplateLabel>,
}

impl LabelRules {
    /// Create an empty rule configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a name-regex rule
    pub fn with_name_regex(mut self, name: impl Into<String>, regexp: impl Into<String>) -> Self {
        self.labels_vm_name.push(VmNameRegexLabel::new(name, regexp));
        self
    }

    /// Append a template-field rule
    pub fn with_template_field(mut self, name: impl Into<String>, field: impl Into<String>) -> Self {
        self.labels_user_template
            .push(UserTemplateLabel::new(name, field));
        self
    }

    /// Total number of configured rules
    pub fn len(&self) -> usize {
        self.labels_vm_name.len() + self.labels_user_template.len()
    }

    /// Check if no rules are configured
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Label keys of all rules, name-regex rules first
    pub fn label_names(&self) -> impl Iterator<Item = &str> {
        self.labels_vm_name
            .iter()
            .map(|r| r.name.as_str())
            .chain(self.labels_user_template.iter().map(|r| r.name.as_str()))
    }
}

/// A name-regex rule paired with its compiled matcher
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// Output label key
    pub name: String,
    /// Compiled matcher
    pub matcher: Regex,
}

/// Outcome of compiling one rule
#[derive(Debug)]
pub enum Compiled<T> {
    /// Rule is ready to evaluate
    Ready(T),
    /// Rule contributes nothing this pass
    Dropped(RuleError),
}

/// Compile a single name-regex rule
pub fn compile_name_rule(rule: &VmNameRegexLabel) -> Compiled<CompiledRule> {
    match Regex::new(&rule.regexp) {
        Ok(matcher) => Compiled::Ready(CompiledRule {
            name: rule.name.clone(),
            matcher,
        }),
        Err(source) => Compiled::Dropped(RuleError::InvalidPattern {
            label: rule.name.clone(),
            pattern: rule.regexp.clone(),
            source,
        }),
    }
}

/// Check a single template-field rule
pub fn compile_template_rule(rule: &UserTemplateLabel) -> Compiled<UserTemplateLabel> {
    if rule.field.is_empty() {
        Compiled::Dropped(RuleError::EmptyTemplateField {
            label: rule.name.clone(),
        })
    } else {
        Compiled::Ready(rule.clone())
    }
}

/// Rules ready for one render pass
#[derive(Debug, Default)]
pub struct CompiledRules {
    name_rules: Vec<CompiledRule>,
    template_rules: Vec<UserTemplateLabel>,
    dropped: Vec<RuleError>,
}

impl CompiledRules {
    /// Compiled name-regex rules, in configuration order
    pub fn name_rules(&self) -> &[CompiledRule] {
        &self.name_rules
    }

    /// Usable template-field rules, in configuration order
    pub fn template_rules(&self) -> &[UserTemplateLabel] {
        &self.template_rules
    }

    /// Rules dropped during compilation
    pub fn dropped(&self) -> &[RuleError] {
        &self.dropped
    }

    /// Number of rules that will be evaluated
    pub fn ready_count(&self) -> usize {
        self.name_rules.len() + self.template_rules.len()
    }
}

/// Compile a rule configuration
///
/// Never fails: rules that cannot be used are recorded in
/// [`CompiledRules::dropped`] and logged at WARN. The VM collection is not
/// involved, so this runs once per render pass regardless of pool size.
pub fn compile(rules: &LabelRules) -> CompiledRules {
    let mut compiled = CompiledRules::default();

    for rule in &rules.labels_vm_name {
        match compile_name_rule(rule) {
            Compiled::Ready(r) => compiled.name_rules.push(r),
            Compiled::Dropped(e) => {
                warn!(label = %rule.name, pattern = %rule.regexp, error = %e, "Dropping name-regex label rule");
                compiled.dropped.push(e);
            }
        }
    }

    for rule in &rules.labels_user_template {
        match compile_template_rule(rule) {
            Compiled::Ready(r) => compiled.template_rules.push(r),
            Compiled::Dropped(e) => {
                warn!(label = %rule.name, error = %e, "Dropping user template label rule");
                compiled.dropped.push(e);
            }
        }
    }

    compiled
}
