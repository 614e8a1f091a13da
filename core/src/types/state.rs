//! Desired state (from the allocator) and persisted state (from the artifact).

use super::network::NetworkRule;

/// What an artifact should record, as assigned by the allocator.
///
/// `mce_segment` is `None` when the MCE has no allocation on record; the
/// VLAN is still known, the network rules are not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredState {
    pub vlan_id: u32,
    pub cluster_segment: String,
    pub mce_segment: Option<String>,
}

impl DesiredState {
    /// Canonical string form used for VLAN equality.
    pub fn vlan_key(&self) -> String {
        self.vlan_id.to_string()
    }

    pub fn is_partial(&self) -> bool {
        self.mce_segment.is_none()
    }
}

/// The managed fields currently recorded in an artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    /// Canonical string form of the stored `vlanId`, whether it was written
    /// as an integer or a string.
    pub vlan_id: Option<String>,
    pub rules: Vec<NetworkRule>,
    /// A non-empty `Networks` value was recorded, even if none of its
    /// items read as a rule.
    pub has_networks: bool,
}

impl PersistedState {
    pub fn empty() -> Self {
        PersistedState::default()
    }

    /// True when neither a `vlanId` nor any `Networks` content is recorded.
    pub fn is_empty(&self) -> bool {
        self.vlan_id.is_none() && self.rules.is_empty() && !self.has_networks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vlan_key_is_decimal() {
        let d = DesiredState {
            vlan_id: 105,
            cluster_segment: "10.1.100.0/24".into(),
            mce_segment: None,
        };
        assert_eq!(d.vlan_key(), "105");
        assert!(d.is_partial());
    }

    #[test]
    fn empty_persisted_state() {
        assert!(PersistedState::empty().is_empty());
        let p = PersistedState {
            vlan_id: Some("9".into()),
            ..PersistedState::default()
        };
        assert!(!p.is_empty());
    }

    #[test]
    fn unreadable_networks_still_count_as_recorded() {
        let p = PersistedState {
            has_networks: true,
            ..PersistedState::default()
        };
        assert!(!p.is_empty());
    }
}
