//! Parsed view of an artifact's managed fields.
//!
//! Reading is lenient: rules missing fields or carrying odd types still
//! parse, with empty segments, so a damaged document is compared rather
//! than rejected. Duplicate top-level keys resolve to the last occurrence.

use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use super::rewrite::{is_continuation, is_document_marker, is_multi_document};
use super::{KEY_AUTOMATIC_ALLOCATION, KEY_NETWORKS, KEY_VLAN_ID};
use crate::error::ReconcileError;
use crate::types::{Endpoint, NetworkRule, PersistedState, Port};

const KEY_FROM: &str = "from";
const KEY_DESTINATION: &str = "destination";
/// Misspelled destination key found in older artifacts.
const KEY_DESTINATION_LEGACY: &str = "destention";
const KEY_SEGMENT: &str = "segment";
const KEY_SYSTEM_NAME: &str = "system-name";

/// Parse the managed fields of an artifact.
///
/// Callers treat `Err` as an empty state; the error only carries the reason
/// for logging.
pub fn parse_persisted(path: &Path, content: &str) -> Result<PersistedState, ReconcileError> {
    let doc = load_document(content).map_err(|reason| ReconcileError::Parse {
        path: path.to_path_buf(),
        reason,
    })?;

    match &doc {
        Value::Mapping(_) => {}
        Value::Null => return Ok(PersistedState::empty()),
        _ => {
            return Err(ReconcileError::Parse {
                path: path.to_path_buf(),
                reason: "top level is not a mapping".into(),
            })
        }
    }

    let vlan_id = doc.get(KEY_VLAN_ID).and_then(canonical_vlan);
    let networks = doc.get(KEY_NETWORKS);
    let rules = match networks {
        Some(Value::Sequence(items)) => items.iter().filter_map(parse_rule).collect(),
        _ => Vec::new(),
    };

    Ok(PersistedState {
        vlan_id,
        rules,
        has_networks: networks.map_or(false, is_truthy),
    })
}

/// Whether the artifact allows automatic reconciliation. Only an explicit
/// `AutomaticAllocation: false` opts out; unreadable documents do not.
pub fn automatic_allocation_enabled(content: &str) -> bool {
    match load_document(content) {
        Ok(doc) => !matches!(doc.get(KEY_AUTOMATIC_ALLOCATION), Some(Value::Bool(false))),
        Err(_) => true,
    }
}

/// Parse the document. When the strict parse fails (serde_yaml refuses
/// duplicate keys, for one), each top-level entry is parsed on its own and
/// merged, a later entry replacing an earlier one with the same key.
/// Entries that still fail are dropped. Multi-document text is refused.
fn load_document(content: &str) -> Result<Value, String> {
    if is_multi_document(content) {
        return Err("more than one YAML document".into());
    }
    let strict = match serde_yaml::from_str::<Value>(content) {
        Ok(doc) => return Ok(doc),
        Err(e) => e,
    };

    let mut merged = Mapping::new();
    for entry in top_level_entries(content) {
        if let Ok(Value::Mapping(fields)) = serde_yaml::from_str::<Value>(&entry) {
            for (key, value) in fields {
                merged.insert(key, value);
            }
        }
    }
    if merged.is_empty() {
        return Err(strict.to_string());
    }
    debug!(error = %strict, keys = merged.len(), "recovered document entry by entry");
    Ok(Value::Mapping(merged))
}

/// Split a document into its top-level entries: each starts at a column-0
/// line and runs until the next one. Lines before the first entry, comments
/// and document markers are left out.
fn top_level_entries(content: &str) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();
    for line in content.split_inclusive('\n') {
        let bare = line.trim_end_matches(|c: char| c == '\n' || c == '\r');
        if is_document_marker(bare) || bare.starts_with('#') || bare.starts_with('%') {
            continue;
        }
        if is_continuation(bare) {
            if let Some(current) = entries.last_mut() {
                current.push_str(line);
            }
            continue;
        }
        entries.push(line.to_string());
    }
    entries
}

/// YAML truthiness: null, `false`, zero and empty values are false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Sequence(items) => !items.is_empty(),
        Value::Mapping(fields) => !fields.is_empty(),
        Value::Tagged(_) => true,
    }
}

/// Canonical string form of a stored VLAN id. Integers and strings compare
/// equal when they spell the same value; null and blank count as absent.
pub fn canonical_vlan(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_rule(item: &Value) -> Option<NetworkRule> {
    if !item.is_mapping() {
        return None;
    }
    let from = endpoint(item.get(KEY_FROM));
    let canonical = endpoint(item.get(KEY_DESTINATION));
    let destination = if canonical.segment.is_empty() {
        endpoint(item.get(KEY_DESTINATION_LEGACY))
    } else {
        canonical
    };

    let ports = match item.get("ports") {
        Some(Value::Sequence(ports)) => ports
            .iter()
            .filter_map(|p| serde_yaml::from_value::<Port>(p.clone()).ok())
            .collect(),
        _ => Vec::new(),
    };

    Some(NetworkRule {
        number: item.get("number").and_then(Value::as_u64).unwrap_or(0) as u32,
        domain: text(item.get("domain")),
        from,
        destination,
        ports,
    })
}

fn endpoint(value: Option<&Value>) -> Endpoint {
    match value {
        Some(v) => Endpoint::new(text(v.get(KEY_SEGMENT)), text(v.get(KEY_SYSTEM_NAME))),
        None => Endpoint::new("", ""),
    }
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}
