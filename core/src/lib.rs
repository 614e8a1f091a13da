//! Cluster network configurator core.
//!
//! Reconciles per-cluster YAML artifacts against the VLAN allocator so each
//! artifact records the allocator-assigned `vlanId` and the bidirectional
//! network rule pair linking the cluster to its MCE. Repeated runs over
//! unchanged desired state write nothing.

pub mod allocator;
pub mod convergence;
pub mod data;
pub mod document;
pub mod error;
pub mod report;
pub mod resolver;
pub mod store;
pub mod types;

pub use convergence::executor::Reconciler;
pub use convergence::planner::decide;
pub use error::ReconcileError;
pub use resolver::{Resolver, SegmentCache};
pub use types::{
    ArtifactResult, ClusterIdentity, DesiredState, PersistedState, ReconciliationAction,
    RunReport, RunStats,
};
