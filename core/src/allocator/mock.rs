//! Mock allocator for testing.
//!
//! Records every call and serves scripted responses, making it easy to
//! assert how many round-trips a reconciliation pass issued.

use std::cell::RefCell;
use std::collections::HashMap;

use super::{AllocationRequest, AllocationResponse, Allocator, SegmentRecord};
use crate::error::AllocatorError;

/// A call observed by the mock, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocatorCall {
    Health,
    AllocatedSegments,
    AllocateVlan(AllocationRequest),
}

/// A test-double allocator with per-cluster scripted allocations.
pub struct MockAllocator {
    pub healthy: bool,
    /// Records served by `allocated_segments`.
    pub segments: Vec<SegmentRecord>,
    /// Fail the bulk fetch even while healthy.
    pub segments_error: Option<AllocatorError>,
    /// Scripted allocation responses, keyed by cluster name.
    pub allocations: HashMap<String, Result<AllocationResponse, AllocatorError>>,
    calls: RefCell<Vec<AllocatorCall>>,
}

impl MockAllocator {
    pub fn new() -> Self {
        MockAllocator {
            healthy: true,
            segments: Vec::new(),
            segments_error: None,
            allocations: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// A mock whose health check fails.
    pub fn unavailable() -> Self {
        MockAllocator {
            healthy: false,
            ..MockAllocator::new()
        }
    }

    /// Pre-load an allocated segment record.
    pub fn with_segment(mut self, owner: &str, segment: &str) -> Self {
        self.segments.push(SegmentRecord {
            cluster_name: Some(owner.to_string()),
            segment: Some(segment.to_string()),
        });
        self
    }

    /// Pre-load a successful allocation for a cluster.
    pub fn with_allocation(mut self, cluster: &str, segment: &str, vlan_id: u32) -> Self {
        self.allocations.insert(
            cluster.to_string(),
            Ok(AllocationResponse {
                segment: Some(segment.to_string()),
                vlan_id: Some(serde_json::json!(vlan_id)),
            }),
        );
        self
    }

    /// Pre-load a raw allocation result for a cluster.
    pub fn set_allocation(&mut self, cluster: &str, result: Result<AllocationResponse, AllocatorError>) {
        self.allocations.insert(cluster.to_string(), result);
    }

    pub fn calls(&self) -> Vec<AllocatorCall> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&AllocatorCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    pub fn bulk_fetches(&self) -> usize {
        self.count(|c| matches!(c, AllocatorCall::AllocatedSegments))
    }

    pub fn allocations_for(&self, cluster: &str) -> usize {
        self.count(|c| matches!(c, AllocatorCall::AllocateVlan(r) if r.cluster_name == cluster))
    }

    /// Clear all recorded calls.
    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: AllocatorCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl Default for MockAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Allocator for MockAllocator {
    fn describe(&self) -> String {
        "mock://allocator".to_string()
    }

    fn health(&self) -> Result<(), AllocatorError> {
        self.record(AllocatorCall::Health);
        if self.healthy {
            Ok(())
        } else {
            Err(AllocatorError::Connect("/health".into()))
        }
    }

    fn allocated_segments(&self) -> Result<Vec<SegmentRecord>, AllocatorError> {
        self.record(AllocatorCall::AllocatedSegments);
        if !self.healthy {
            return Err(AllocatorError::Connect("/segments".into()));
        }
        match &self.segments_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.segments.clone()),
        }
    }

    fn allocate_vlan(&self, request: &AllocationRequest) -> Result<AllocationResponse, AllocatorError> {
        self.record(AllocatorCall::AllocateVlan(request.clone()));
        if !self.healthy {
            return Err(AllocatorError::Connect("/allocate-vlan".into()));
        }
        self.allocations
            .get(&request.cluster_name)
            .cloned()
            .unwrap_or_else(|| {
                Err(AllocatorError::Status {
                    endpoint: "/allocate-vlan".into(),
                    status: 404,
                })
            })
    }
}
