//! Network rule model and the canonical rule pair written into artifacts.

use serde::{Deserialize, Serialize};

/// Domain written on every generated rule.
pub const DEFAULT_DOMAIN: &str = "default";

/// One side of a network rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub segment: String,
    #[serde(rename = "system-name")]
    pub system_name: String,
}

impl Endpoint {
    pub fn new(segment: impl Into<String>, system_name: impl Into<String>) -> Self {
        Endpoint {
            segment: segment.into(),
            system_name: system_name.into(),
        }
    }
}

/// A port entry: either a single port or an inclusive range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Port {
    Port { number: u16, protocol: String },
    Range { start: u16, end: u16, protocol: String },
}

/// A directed rule from one endpoint to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRule {
    pub number: u32,
    pub domain: String,
    pub from: Endpoint,
    pub destination: Endpoint,
    pub ports: Vec<Port>,
}

impl NetworkRule {
    /// Whether this rule links `a` and `b`, in either direction.
    pub fn links(&self, a: &str, b: &str) -> bool {
        let from = self.from.segment.as_str();
        let to = self.destination.segment.as_str();
        (from == a && to == b) || (from == b && to == a)
    }
}

/// The fixed port set carried by every generated rule: 80/TCP, 8080/TCP and
/// the 30000-36000/TCP range.
pub fn default_ports() -> Vec<Port> {
    vec![
        Port::Port { number: 80, protocol: "TCP".into() },
        Port::Port { number: 8080, protocol: "TCP".into() },
        Port::Range { start: 30000, end: 36000, protocol: "TCP".into() },
    ]
}

fn rule(number: u32, from: Endpoint, destination: Endpoint) -> NetworkRule {
    NetworkRule {
        number,
        domain: DEFAULT_DOMAIN.into(),
        from,
        destination,
        ports: default_ports(),
    }
}

/// Build the rule pair: MCE -> cluster numbered 1, cluster -> MCE numbered 2.
pub fn bidirectional_rules(
    mce_segment: &str,
    mce_name: &str,
    cluster_segment: &str,
    cluster_name: &str,
) -> Vec<NetworkRule> {
    let mce = Endpoint::new(mce_segment, mce_name);
    let cluster = Endpoint::new(cluster_segment, cluster_name);
    vec![
        rule(1, mce.clone(), cluster.clone()),
        rule(2, cluster, mce),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_is_numbered_and_mirrored() {
        let rules = bidirectional_rules("10.0.50.0/24", "mce-a", "10.1.100.0/24", "ocp4-roi");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].number, 1);
        assert_eq!(rules[0].from, Endpoint::new("10.0.50.0/24", "mce-a"));
        assert_eq!(rules[0].destination, Endpoint::new("10.1.100.0/24", "ocp4-roi"));
        assert_eq!(rules[1].number, 2);
        assert_eq!(rules[1].from, rules[0].destination);
        assert_eq!(rules[1].destination, rules[0].from);
    }

    #[test]
    fn links_is_unordered() {
        let rules = bidirectional_rules("A", "m", "B", "c");
        assert!(rules[0].links("A", "B"));
        assert!(rules[0].links("B", "A"));
        assert!(!rules[0].links("A", "C"));
    }

    #[test]
    fn ports_are_all_tcp() {
        let ports = default_ports();
        assert_eq!(ports.len(), 3);
        for p in &ports {
            let proto = match p {
                Port::Port { protocol, .. } | Port::Range { protocol, .. } => protocol,
            };
            assert_eq!(proto, "TCP");
        }
    }

    #[test]
    fn port_serializes_with_type_tag() {
        let yaml = serde_yaml::to_string(&default_ports()[2]).unwrap();
        assert!(yaml.contains("type: range"));
        assert!(yaml.contains("start: 30000"));
        assert!(yaml.contains("end: 36000"));
    }

    #[test]
    fn endpoint_uses_hyphenated_key() {
        let yaml = serde_yaml::to_string(&Endpoint::new("10.0.0.0/24", "mce")).unwrap();
        assert!(yaml.contains("system-name: mce"));
    }
}
