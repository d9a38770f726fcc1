//! Pool rendering
//!
//! Renders a whole VM pool snapshot into one exposition body, one line per
//! VM in input order.

use std::sync::Arc;

use tracing::debug;

use super::formatter::write_line;
use super::resolver::resolve_labels;
use super::rules::{compile, CompiledRules, LabelRules};
use crate::inventory::VmRecord;

/// Render a pool, compiling the label rules for this pass
///
/// An empty pool renders as an empty string.
pub fn render_pool(vms: &[VmRecord], rules: &LabelRules, namespace: &str) -> String {
    let compiled = compile(rules);
    render_compiled(vms, &compiled, namespace)
}

fn render_compiled(vms: &[VmRecord], compiled: &CompiledRules, namespace: &str) -> String {
    let mut output = String::with_capacity(vms.len() * 160);

    for vm in vms {
        let labels = resolve_labels(vm, compiled);
        write_line(&mut output, namespace, vm, &labels);
    }

    debug!(
        vms = vms.len(),
        name_rules = compiled.name_rules().len(),
        template_rules = compiled.template_rules().len(),
        dropped_rules = compiled.dropped().len(),
        "Rendered VM pool"
    );

    output
}

/// Pool renderer holding rules compiled once
///
/// The rules are owned through an `Arc` and never mutated, so the compiled
/// matchers stay valid for the renderer's lifetime. Build a new renderer to
/// pick up a different configuration.
#[derive(Debug)]
pub struct PoolRenderer {
    namespace: String,
    rules: Arc<LabelRules>,
    compiled: CompiledRules,
}

impl PoolRenderer {
    /// Create a renderer, compiling `rules` immediately
    pub fn new(namespace: impl Into<String>, rules: Arc<LabelRules>) -> Self {
        let compiled = compile(&rules);
        Self {
            namespace: namespace.into(),
            rules,
            compiled,
        }
    }

    /// Metric namespace prefix
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The rule configuration this renderer was built from
    pub fn rules(&self) -> &LabelRules {
        &self.rules
    }

    /// The compiled rules
    pub fn compiled(&self) -> &CompiledRules {
        &self.compiled
    }

    /// Render a pool snapshot
    pub fn render(&self, vms: &[VmRecord]) -> String {
        render_compiled(vms, &self.compiled, &self.namespace)
    }
}
