//! Shared data model: identities, desired and persisted state, network rules,
//! and per-artifact outcomes.

pub mod cluster;
pub mod network;
pub mod outcome;
pub mod state;

pub use cluster::ClusterIdentity;
pub use network::{bidirectional_rules, default_ports, Endpoint, NetworkRule, Port};
pub use outcome::{ArtifactResult, ReconciliationAction, RunReport, RunStats};
pub use state::{DesiredState, PersistedState};
