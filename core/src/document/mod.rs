//! Artifact document handling: reading the managed fields out of a YAML
//! document and rewriting them without touching anything else.

pub mod persisted;
pub mod rewrite;

/// Top-level key holding the VLAN id.
pub const KEY_VLAN_ID: &str = "vlanId";
/// Top-level key holding the network rule list.
pub const KEY_NETWORKS: &str = "Networks";
/// Top-level opt-out flag.
pub const KEY_AUTOMATIC_ALLOCATION: &str = "AutomaticAllocation";

pub use persisted::{automatic_allocation_enabled, parse_persisted};
pub use rewrite::{is_multi_document, render_managed, rewrite, strip_managed, LineState};
