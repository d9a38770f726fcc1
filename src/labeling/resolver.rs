//! Label resolution for a single VM
//!
//! Name-regex rules contribute a label only when they match. Template-field
//! rules always contribute, falling back to [`UNKNOWN_VALUE`] when the VM
//! has no such field. Name-regex labels precede template labels and each
//! group keeps configuration order.

use regex::Regex;

use super::rules::{CompiledRule, CompiledRules, UserTemplateLabel};
use crate::inventory::VmRecord;

/// Value used when a template field is missing
pub const UNKNOWN_VALUE: &str = "unknown";

/// A resolved extra label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

/// Result of testing a VM name against one matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch<'a> {
    /// Pattern matched; carries the extracted value
    Matched(&'a str),
    /// Pattern did not match
    NoMatch,
}

/// Result of looking up one user template field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLookup<'a> {
    /// Field is present
    Present(&'a str),
    /// Field is missing
    Fallback,
}

impl<'a> FieldLookup<'a> {
    /// Value to emit for this lookup
    pub fn value(&self) -> &'a str {
        match self {
            FieldLookup::Present(v) => v,
            FieldLookup::Fallback => UNKNOWN_VALUE,
        }
    }
}

/// Match a VM name and extract the label value
///
/// With capturing groups, the last group wins; a last group that did not
/// take part in the match yields an empty value. Without groups, the whole
/// match is used.
pub fn match_name<'a>(matcher: &Regex, name: &'a str) -> NameMatch<'a> {
    let Some(caps) = matcher.captures(name) else {
        return NameMatch::NoMatch;
    };

    // captures_len() counts the implicit whole-match group 0
    let last = matcher.captures_len() - 1;
    let value = caps.get(last).map_or("", |m| m.as_str());
    NameMatch::Matched(value)
}

/// Look up a template field on a VM
pub fn lookup_field<'a>(vm: &'a VmRecord, field: &str) -> FieldLookup<'a> {
    match vm.template_field(field) {
        Some(v) => FieldLookup::Present(v),
        None => FieldLookup::Fallback,
    }
}

/// Labels contributed by name-regex rules
pub fn resolve_name_labels<'a>(vm: &'a VmRecord, rules: &'a [CompiledRule]) -> Vec<Label<'a>> {
    rules
        .iter()
        .filter_map(|rule| match match_name(&rule.matcher, &vm.name) {
            NameMatch::Matched(value) => Some(Label {
                key: &rule.name,
                value,
            }),
            NameMatch::NoMatch => None,
        })
        .collect()
}

/// Labels contributed by template-field rules
pub fn resolve_template_labels<'a>(
    vm: &'a VmRecord,
    rules: &'a [UserTemplateLabel],
) -> Vec<Label<'a>> {
    rules
        .iter()
        .map(|rule| Label {
            key: &rule.name,
            value: lookup_field(vm, &rule.field).value(),
        })
        .collect()
}

/// All extra labels for a VM, name-regex labels first
///
/// Duplicate keys are passed through unchanged.
pub fn resolve_labels<'a>(vm: &'a VmRecord, rules: &'a CompiledRules) -> Vec<Label<'a>> {
    let mut labels = resolve_name_labels(vm, rules.name_rules());
    labels.extend(resolve_template_labels(vm, rules.template_rules()));
    labels
}
