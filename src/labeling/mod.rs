//! VM label derivation and line rendering
//!
//! This module turns a VM pool snapshot and the operator's label rules into
//! Prometheus exposition text:
//!
//! 1. [`rules`] compiles the rule configuration once per pass
//! 2. [`resolver`] computes the extra labels of each VM
//! 3. [`formatter`] writes one escaped line per VM
//! 4. [`pool`] drives the whole pass
//!
//! # Example
//!
//! ```ignore
//! use opennebula_exporter::inventory::VmRecord;
//! use opennebula_exporter::labeling::{render_pool, LabelRules};
//!
//! let rules = LabelRules::new().with_name_regex("shard", r"staging-(\w+)-\d+");
//! let vms = vec![VmRecord::new(1, "staging-web-03")];
//! let body = render_pool(&vms, &rules, "opennebula");
//! ```

pub mod formatter;
pub mod pool;
pub mod resolver;
pub mod rules;

pub use formatter::{escape_label_value, render_line, write_line, METRIC_SUFFIX};
pub use pool::{render_pool, PoolRenderer};
pub use resolver::{
    lookup_field, match_name, resolve_labels, resolve_name_labels, resolve_template_labels,
    FieldLookup, Label, NameMatch, UNKNOWN_VALUE,
};
pub use rules::{
    compile, compile_name_rule, compile_template_rule, Compiled, CompiledRule, CompiledRules,
    LabelRules, UserTemplateLabel, VmNameRegexLabel,
};
