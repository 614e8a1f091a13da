//! Line-level rewrite of the managed fields.
//!
//! Every line outside the managed `vlanId` entry and `Networks` block is
//! copied through byte for byte and in order. The managed fields are then
//! appended as a freshly serialized block.
//!
//! Block removal is a two-state machine over lines:
//!
//! ```text
//!   Normal --(top-level `Networks:`)--> InManagedBlock
//!   InManagedBlock --(indented | list item | blank)--> InManagedBlock   (line dropped)
//!   InManagedBlock --(any other line)--> Normal                         (line re-classified)
//! ```
//!
//! A top-level `vlanId:` line with its value inline is dropped on its own.
//! A bare `vlanId:` (or a block scalar indicator) opens a block like
//! `Networks:` does, since its value lives on the following indented lines.
//!
//! Artifacts holding several YAML documents are rejected: the managed block
//! would land in the last document only.

use serde::Serialize;

use super::{KEY_NETWORKS, KEY_VLAN_ID};
use crate::error::ReconcileError;
use crate::types::{bidirectional_rules, ClusterIdentity, DesiredState, NetworkRule};

/// Scanner state while stripping managed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    Normal,
    InManagedBlock,
}

/// How a single line is treated in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    VlanKey,
    NetworksKey,
    Continuation,
    Other,
}

fn classify(line: &str) -> LineKind {
    if is_top_level_key(line, KEY_VLAN_ID) {
        LineKind::VlanKey
    } else if is_top_level_key(line, KEY_NETWORKS) {
        LineKind::NetworksKey
    } else if is_continuation(line) {
        LineKind::Continuation
    } else {
        LineKind::Other
    }
}

/// `key:` at column zero, followed by whitespace or end of line.
fn is_top_level_key(line: &str, key: &str) -> bool {
    match line.strip_prefix(key).and_then(|rest| rest.strip_prefix(':')) {
        Some(rest) => rest.is_empty() || rest.starts_with(char::is_whitespace),
        None => false,
    }
}

/// True when the value of a top-level `key:` line continues on the next
/// lines: nothing but a comment after the colon, or a block scalar.
fn opens_block(line: &str, key: &str) -> bool {
    let rest = line.get(key.len() + 1..).unwrap_or("").trim();
    rest.is_empty() || rest.starts_with('#') || rest.starts_with('|') || rest.starts_with('>')
}

/// Indented, a list item, or blank.
pub(super) fn is_continuation(line: &str) -> bool {
    if line.trim().is_empty() {
        return true;
    }
    if line.starts_with(' ') || line.starts_with('\t') {
        return true;
    }
    match line.strip_prefix('-') {
        Some(rest) => rest.is_empty() || rest.starts_with(char::is_whitespace),
        None => false,
    }
}

/// Advance the machine by one line. Returns the next state and whether the
/// line is kept.
pub fn step(state: LineState, line: &str) -> (LineState, bool) {
    let kind = classify(line);
    if state == LineState::InManagedBlock && kind == LineKind::Continuation {
        return (LineState::InManagedBlock, false);
    }
    match kind {
        LineKind::VlanKey if opens_block(line, KEY_VLAN_ID) => (LineState::InManagedBlock, false),
        LineKind::VlanKey => (LineState::Normal, false),
        LineKind::NetworksKey => (LineState::InManagedBlock, false),
        LineKind::Continuation | LineKind::Other => (LineState::Normal, true),
    }
}

/// `---` or `...` at column zero, optionally followed by inline content.
pub(super) fn is_document_marker(line: &str) -> bool {
    ["---", "..."].iter().any(|marker| match line.strip_prefix(marker) {
        Some(rest) => rest.is_empty() || rest.starts_with(char::is_whitespace),
        None => false,
    })
}

/// Whether the text holds content in more than one YAML document. A
/// leading `---` or a trailing `...` alone still counts as one document.
pub fn is_multi_document(text: &str) -> bool {
    let mut seen_content = false;
    let mut ended = false;
    for line in text.lines() {
        if is_document_marker(line) {
            if line.starts_with("...") {
                ended = seen_content || ended;
                continue;
            }
            if seen_content || ended {
                return true;
            }
            seen_content = !line[3..].trim().is_empty();
            continue;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || line.starts_with('%') {
            continue;
        }
        if ended {
            return true;
        }
        seen_content = true;
    }
    false
}

/// Remove the managed fields, keeping every other line verbatim (line
/// endings included).
pub fn strip_managed(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut state = LineState::Normal;
    for line in text.split_inclusive('\n') {
        let (next, keep) = step(state, line.trim_end_matches(|c: char| c == '\n' || c == '\r'));
        if keep {
            out.push_str(line);
        }
        state = next;
    }
    out
}

#[derive(Serialize)]
struct ManagedBlock {
    #[serde(rename = "vlanId")]
    vlan_id: u32,
    #[serde(rename = "Networks", skip_serializing_if = "Option::is_none")]
    networks: Option<Vec<NetworkRule>>,
}

/// Serialize the managed fields: `vlanId`, then `Networks` only when the
/// MCE segment is known.
pub fn render_managed(desired: &DesiredState, identity: &ClusterIdentity) -> Result<String, ReconcileError> {
    let networks = desired.mce_segment.as_deref().map(|mce_segment| {
        bidirectional_rules(
            mce_segment,
            &identity.mce_name,
            &desired.cluster_segment,
            &identity.cluster_name,
        )
    });
    let block = ManagedBlock { vlan_id: desired.vlan_id, networks };
    serde_yaml::to_string(&block).map_err(|e| ReconcileError::Parse {
        path: identity.artifact.clone(),
        reason: format!("cannot serialize managed block: {}", e),
    })
}

/// Produce the new artifact text: unmanaged content first, then the managed
/// block. Prior `vlanId`/`Networks` entries are replaced wholesale.
pub fn rewrite(text: &str, desired: &DesiredState, identity: &ClusterIdentity) -> Result<String, ReconcileError> {
    if is_multi_document(text) {
        return Err(ReconcileError::MultiDocument {
            path: identity.artifact.clone(),
        });
    }
    let mut out = strip_managed(text);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&render_managed(desired, identity)?);
    Ok(out)
}
