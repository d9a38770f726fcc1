//! Prometheus exposition line output
//!
//! Each VM becomes exactly one presence line:
//!
//! ```text
//! <namespace>_vms{name="<name>",id="<id>",state="<state>",lcm_state="<lcm>",host="<host>"[,<key>="<value>"]*} 1
//! ```
//!
//! Label values may come from user-controlled VM names and template fields,
//! so every value goes through [`escape_label_value`].

use std::fmt::Write;

use super::resolver::Label;
use crate::inventory::VmRecord;

/// Metric name suffix appended to the namespace
pub const METRIC_SUFFIX: &str = "_vms";

/// Escape a label value
///
/// Escapes backslash, double-quote, and newline characters.
pub fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    push_escaped(&mut escaped, value);
    escaped
}

fn push_escaped(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
}

fn push_label(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str("=\"");
    push_escaped(out, value);
    out.push('"');
}

/// Append one VM line, including its trailing newline, to `out`
pub fn write_line(out: &mut String, namespace: &str, vm: &VmRecord, extra: &[Label<'_>]) {
    out.push_str(namespace);
    out.push_str(METRIC_SUFFIX);
    out.push('{');

    push_label(out, "name", &vm.name);
    // writing into a String cannot fail
    let _ = write!(out, ",id=\"{}\"", vm.id);
    out.push(',');
    push_label(out, "state", &vm.state);
    out.push(',');
    push_label(out, "lcm_state", &vm.lcm_state);
    out.push(',');
    push_label(out, "host", &vm.host);

    for label in extra {
        out.push(',');
        push_label(out, label.key, label.value);
    }

    out.push_str("} 1\n");
}

/// Render one VM line
pub fn render_line(namespace: &str, vm: &VmRecord, extra: &[Label<'_>]) -> String {
    let mut line = String::with_capacity(128);
    write_line(&mut line, namespace, vm, extra);
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vm() -> VmRecord {
        VmRecord::new(42, "web-01")
            .with_state("ACTIVE", "RUNNING")
            .with_host("node-a")
    }

    #[test]
    fn test_render_line_base_labels() {
        let line = render_line("opennebula", &sample_vm(), &[]);
        assert_eq!(
            line,
            "opennebula_vms{name=\"web-01\",id=\"42\",state=\"ACTIVE\",lcm_state=\"RUNNING\",host=\"node-a\"} 1\n"
        );
    }

    #[test]
    fn test_render_line_extra_labels_in_order() {
        let extra = [
            Label {
                key: "env",
                value: "prod",
            },
            Label {
                key: "owner",
                value: "teamA",
            },
        ];
        let line = render_line("one", &sample_vm(), &extra);
        assert!(line.ends_with(",host=\"node-a\",env=\"prod\",owner=\"teamA\"} 1\n"));
    }

    #[test]
    fn test_render_line_empty_host() {
        let vm = VmRecord::new(1, "pending-vm").with_state("PENDING", "LCM_INIT");
        let line = render_line("one", &vm, &[]);
        assert!(line.contains(",host=\"\"} 1\n"));
    }

    #[test]
    fn test_render_line_escapes_name() {
        let vm = VmRecord::new(1, "ab\"c");
        let line = render_line("one", &vm, &[]);
        assert!(line.starts_with("one_vms{name=\"ab\\\"c\",id=\"1\""));
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn test_render_line_escapes_extra_values() {
        let extra = [Label {
            key: "note",
            value: "x\"} 1\nevil{a=\"b",
        }];
        let line = render_line("one", &sample_vm(), &extra);
        assert!(line.contains("note=\"x\\\"} 1\\nevil{a=\\\"b\"} 1\n"));
        assert_eq!(line.lines().count(), 1);
    }

    #[test]
    fn test_escape_label_value() {
        assert_eq!(escape_label_value("simple"), "simple");
        assert_eq!(escape_label_value("with\"quote"), "with\\\"quote");
        assert_eq!(escape_label_value("with\\backslash"), "with\\\\backslash");
        assert_eq!(escape_label_value("with\nnewline"), "with\\nnewline");
        assert_eq!(escape_label_value("all\"\\\n"), "all\\\"\\\\\\n");
    }

    #[test]
    fn test_escape_label_value_keeps_unicode() {
        assert_eq!(escape_label_value("vm-ñandú-🚀"), "vm-ñandú-🚀");
    }
}
