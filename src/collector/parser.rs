//! VM pool document parser
//!
//! Parses OpenNebula's JSON rendering of a VM pool into [`VmRecord`]s.
//! The rendering is loose: single-element lists collapse into objects,
//! numeric attributes may arrive as strings, and empty elements may be
//! missing entirely.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::CollectorError;
use crate::inventory::{lcm_state_name, vm_state_name, VmRecord};

/// Collector result type
pub type CollectResult<T> = Result<T, CollectorError>;

/// Parse a VM pool document, preserving VM order
pub fn parse_pool(json: &str) -> CollectResult<Vec<VmRecord>> {
    let raw: RawPoolDocument =
        serde_json::from_str(json).map_err(|e| CollectorError::JsonParse(e.to_string()))?;

    let vms = match raw.vm_pool.and_then(|pool| pool.vm) {
        Some(OneOrMany::Many(vms)) => vms,
        Some(OneOrMany::One(vm)) => vec![vm],
        None => return Ok(vec![]),
    };

    vms.into_iter().map(convert_raw_vm).collect()
}

/// A value that is either a single element or a list of elements
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// Raw document shapes, used only while parsing
#[derive(Deserialize)]
struct RawPoolDocument {
    #[serde(rename = "VM_POOL", default)]
    vm_pool: Option<RawVmPool>,
}

#[derive(Deserialize)]
struct RawVmPool {
    #[serde(rename = "VM", default)]
    vm: Option<OneOrMany<RawVm>>,
}

#[derive(Deserialize)]
struct RawVm {
    #[serde(rename = "ID")]
    id: Value,
    #[serde(rename = "NAME", default)]
    name: String,
    #[serde(rename = "STATE", default)]
    state: Option<Value>,
    #[serde(rename = "LCM_STATE", default)]
    lcm_state: Option<Value>,
    #[serde(rename = "USER_TEMPLATE", default)]
    user_template: Option<Value>,
    #[serde(rename = "HISTORY_RECORDS", default)]
    history_records: Option<Value>,
}

fn convert_raw_vm(raw: RawVm) -> CollectResult<VmRecord> {
    let id = parse_code(&raw.id, "ID")?;

    let state = match &raw.state {
        Some(v) => vm_state_name(parse_small_code(v, "STATE")?).into_owned(),
        None => String::new(),
    };
    let lcm_state = match &raw.lcm_state {
        Some(v) => lcm_state_name(parse_small_code(v, "LCM_STATE")?).into_owned(),
        None => String::new(),
    };

    Ok(VmRecord {
        id,
        name: raw.name,
        state,
        lcm_state,
        host: last_hostname(raw.history_records.as_ref()),
        user_template: template_fields(raw.user_template.as_ref()),
    })
}

/// Numeric attribute given as a JSON number or a decimal string
fn parse_code(value: &Value, field: &str) -> CollectResult<u64> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| {
        CollectorError::MalformedPool(format!("{} is not a non-negative integer: {}", field, value))
    })
}

fn parse_small_code(value: &Value, field: &str) -> CollectResult<u32> {
    let code = parse_code(value, field)?;
    u32::try_from(code)
        .map_err(|_| CollectorError::MalformedPool(format!("{} out of range: {}", field, code)))
}

/// Scalar user template entries; nested attributes are skipped
fn template_fields(template: Option<&Value>) -> BTreeMap<String, String> {
    let Some(Value::Object(map)) = template else {
        return BTreeMap::new();
    };

    map.iter()
        .filter_map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((k.clone(), value))
        })
        .collect()
}

/// Host of the most recent history record
fn last_hostname(history_records: Option<&Value>) -> String {
    let latest = match history_records.and_then(|h| h.get("HISTORY")) {
        Some(Value::Array(entries)) => entries.last(),
        Some(entry @ Value::Object(_)) => Some(entry),
        _ => None,
    };

    latest
        .and_then(|entry| entry.get("HOSTNAME"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
