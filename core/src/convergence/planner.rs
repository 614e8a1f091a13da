//! Equality oracle: decides whether an artifact needs a rewrite.
//!
//! The decision is stateless: it takes the desired state and the persisted
//! state and returns an action. It never reads storage or calls the
//! allocator.

use crate::types::{DesiredState, PersistedState, ReconciliationAction};

/// Whether the persisted `vlanId` equals the desired one in canonical form.
pub fn vlan_matches(desired: &DesiredState, persisted: &PersistedState) -> bool {
    persisted.vlan_id.as_deref() == Some(desired.vlan_key().as_str())
}

/// Whether some persisted rule links the MCE and cluster segments, in
/// either direction. Always true when the MCE segment is unknown.
pub fn segments_match(desired: &DesiredState, persisted: &PersistedState) -> bool {
    match desired.mce_segment.as_deref() {
        None => true,
        Some(mce) => persisted
            .rules
            .iter()
            .any(|r| r.links(mce, &desired.cluster_segment)),
    }
}

/// Decide the action for one artifact.
///
/// # Returns
///
/// * `NoChange` when both the VLAN and the segment pair match.
/// * `Updated` when something was recorded before but does not match.
/// * `Added` when nothing managed was recorded.
pub fn decide(desired: &DesiredState, persisted: &PersistedState) -> ReconciliationAction {
    if vlan_matches(desired, persisted) && segments_match(desired, persisted) {
        ReconciliationAction::NoChange
    } else if persisted.is_empty() {
        ReconciliationAction::Added
    } else {
        ReconciliationAction::Updated
    }
}
