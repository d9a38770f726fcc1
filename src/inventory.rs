//! VM inventory data model
//!
//! A [`VmRecord`] is one entry of a VM pool snapshot as reported by the
//! OpenNebula control plane. Records are produced by the collector and read
//! (never mutated) by the labeling engine.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::Serialize;

/// OpenNebula VM states, indexed by state code
const VM_STATES: &[&str] = &[
    "INIT",
    "PENDING",
    "HOLD",
    "ACTIVE",
    "STOPPED",
    "SUSPENDED",
    "DONE",
    "FAILED",
    "POWEROFF",
    "UNDEPLOYED",
    "CLONING",
    "CLONING_FAILURE",
];

/// OpenNebula LCM states, indexed by LCM state code
const LCM_STATES: &[&str] = &[
    "LCM_INIT",
    "PROLOG",
    "BOOT",
    "RUNNING",
    "MIGRATE",
    "SAVE_STOP",
    "SAVE_SUSPEND",
    "SAVE_MIGRATE",
    "PROLOG_MIGRATE",
    "PROLOG_RESUME",
    "EPILOG_STOP",
    "EPILOG",
    "SHUTDOWN",
    "CANCEL",
    "FAILURE",
    "CLEANUP_RESUBMIT",
    "UNKNOWN",
    "HOTPLUG",
    "SHUTDOWN_POWEROFF",
    "BOOT_UNKNOWN",
    "BOOT_POWEROFF",
    "BOOT_SUSPENDED",
    "BOOT_STOPPED",
    "CLEANUP_DELETE",
    "HOTPLUG_SNAPSHOT",
    "HOTPLUG_NIC",
    "HOTPLUG_SAVEAS",
    "HOTPLUG_SAVEAS_POWEROFF",
    "HOTPLUG_SAVEAS_SUSPENDED",
    "SHUTDOWN_UNDEPLOY",
    "EPILOG_UNDEPLOY",
    "PROLOG_UNDEPLOY",
    "BOOT_UNDEPLOY",
    "HOTPLUG_PROLOG_POWEROFF",
    "HOTPLUG_EPILOG_POWEROFF",
    "BOOT_MIGRATE",
    "BOOT_FAILURE",
    "BOOT_MIGRATE_FAILURE",
    "PROLOG_MIGRATE_FAILURE",
    "PROLOG_FAILURE",
    "EPILOG_FAILURE",
    "EPILOG_STOP_FAILURE",
    "EPILOG_UNDEPLOY_FAILURE",
    "PROLOG_MIGRATE_POWEROFF",
    "PROLOG_MIGRATE_POWEROFF_FAILURE",
    "PROLOG_MIGRATE_SUSPEND",
    "PROLOG_MIGRATE_SUSPEND_FAILURE",
    "BOOT_UNDEPLOY_FAILURE",
    "BOOT_STOPPED_FAILURE",
    "PROLOG_RESUME_FAILURE",
    "PROLOG_UNDEPLOY_FAILURE",
];

/// Name of a VM state code; unknown codes render as the decimal code
pub fn vm_state_name(code: u32) -> Cow<'static, str> {
    lookup(VM_STATES, code)
}

/// Name of an LCM state code; unknown codes render as the decimal code
pub fn lcm_state_name(code: u32) -> Cow<'static, str> {
    lookup(LCM_STATES, code)
}

fn lookup(table: &'static [&'static str], code: u32) -> Cow<'static, str> {
    match table.get(code as usize) {
        Some(name) => Cow::Borrowed(name),
        None => Cow::Owned(code.to_string()),
    }
}

/// A single VM from a pool snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VmRecord {
    /// Numeric VM id, unique within a snapshot
    pub id: u64,
    /// Human-assigned VM name
    pub name: String,
    /// VM state name (e.g. `ACTIVE`)
    pub state: String,
    /// LCM state name (e.g. `RUNNING`)
    pub lcm_state: String,
    /// Host currently running the VM; empty when unscheduled
    pub host: String,
    /// Operator-defined custom template fields
    pub user_template: BTreeMap<String, String>,
}

impl VmRecord {
    /// Create a record with the given id and name and no other attributes
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the state and LCM state names
    pub fn with_state(mut self, state: impl Into<String>, lcm_state: impl Into<String>) -> Self {
        self.state = state.into();
        self.lcm_state = lcm_state.into();
        self
    }

    /// Set the host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Add a user template field
    pub fn with_template_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.user_template.insert(key.into(), value.into());
        self
    }

    /// Look up a user template field
    pub fn template_field(&self, field: &str) -> Option<&str> {
        self.user_template.get(field).map(String::as_str)
    }
}
