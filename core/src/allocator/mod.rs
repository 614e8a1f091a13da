//! VLAN allocator client seam.
//!
//! Provides the `Allocator` trait and implementations for HTTP (production)
//! and mock (testing). Everything above this module talks to the trait only.

pub mod http;
pub mod mock;

use serde::{Deserialize, Serialize};

use crate::error::AllocatorError;

/// VRF sent with allocation requests unless settings override it.
pub const DEFAULT_VRF: &str = "Network1";

/// One record of `GET /segments?allocated=true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRecord {
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub segment: Option<String>,
}

/// Body of `POST /allocate-vlan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub cluster_name: String,
    pub site: String,
    pub vrf: String,
}

/// Response of `POST /allocate-vlan`. Fields stay optional here; the resolver
/// decides whether the response is complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AllocationResponse {
    #[serde(default)]
    pub segment: Option<String>,
    #[serde(default)]
    pub vlan_id: Option<serde_json::Value>,
}

/// Operations this tool consumes from the allocator service.
pub trait Allocator {
    /// Base location, used in log and error messages.
    fn describe(&self) -> String;

    /// `GET /health`. Any successful response means available.
    fn health(&self) -> Result<(), AllocatorError>;

    /// `GET /segments?allocated=true`, a flat list of assignments.
    fn allocated_segments(&self) -> Result<Vec<SegmentRecord>, AllocatorError>;

    /// `POST /allocate-vlan`. The allocator is idempotent per cluster.
    fn allocate_vlan(&self, request: &AllocationRequest) -> Result<AllocationResponse, AllocatorError>;
}
