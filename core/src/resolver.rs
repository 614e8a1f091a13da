//! Desired-state resolution with a once-per-run segment cache.
//!
//! `warm_cache` issues the single bulk read of a run. After that, MCE
//! lookups are pure cache reads, and every successful cluster allocation is
//! written back into the cache so a cluster that is also some other
//! cluster's MCE resolves without another round-trip.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::allocator::{AllocationRequest, AllocationResponse, Allocator};
use crate::error::ReconcileError;

/// Entity name (cluster or MCE) -> allocated segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentCache {
    entries: HashMap<String, String>,
}

impl SegmentCache {
    pub fn new() -> Self {
        SegmentCache::default()
    }

    pub fn get(&self, owner: &str) -> Option<&str> {
        self.entries.get(owner).map(|s| s.as_str())
    }

    pub fn insert(&mut self, owner: &str, segment: &str) {
        self.entries.insert(owner.to_string(), segment.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A fresh allocation for one cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub segment: String,
    pub vlan_id: u32,
}

/// Resolves desired state for a run. Holds the allocator handle, the
/// segment cache and the VRF sent with allocation requests.
pub struct Resolver<'a> {
    allocator: &'a dyn Allocator,
    cache: SegmentCache,
    vrf: String,
    warmed: bool,
    available: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(allocator: &'a dyn Allocator, vrf: impl Into<String>) -> Self {
        Resolver {
            allocator,
            cache: SegmentCache::new(),
            vrf: vrf.into(),
            warmed: false,
            available: true,
        }
    }

    /// Fetch every allocator-confirmed assignment once and populate the
    /// cache. Returns the number of cached entries.
    ///
    /// Calling this again on a warmed resolver is a no-op. An unreachable
    /// allocator leaves the cache empty and marks it unavailable.
    pub fn warm_cache(&mut self) -> usize {
        if self.warmed {
            return self.cache.len();
        }
        self.warmed = true;

        match self.allocator.allocated_segments() {
            Ok(records) => {
                for record in records {
                    if let (Some(owner), Some(segment)) = (record.cluster_name, record.segment) {
                        if !owner.is_empty() && !segment.is_empty() {
                            self.cache.insert(&owner, &segment);
                        }
                    }
                }
                debug!(entries = self.cache.len(), "segment cache warmed");
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch segments from allocator");
                self.available = false;
            }
        }
        self.cache.len()
    }

    /// Request a fresh allocation for `cluster_name` at `site`.
    ///
    /// On success the `(cluster_name -> segment)` pair is inserted into the
    /// segment cache as a side effect. Refused once a cache warm has failed.
    pub fn allocate_cluster_segment(
        &mut self,
        cluster_name: &str,
        site: &str,
    ) -> Result<Allocation, ReconcileError> {
        if !self.available {
            return Err(ReconcileError::Allocation {
                cluster: cluster_name.to_string(),
                reason: "allocator unavailable".to_string(),
            });
        }
        let request = AllocationRequest {
            cluster_name: cluster_name.to_string(),
            site: site.to_string(),
            vrf: self.vrf.clone(),
        };
        debug!(cluster = %cluster_name, site = %site, "requesting VLAN allocation");

        let response = self
            .allocator
            .allocate_vlan(&request)
            .map_err(|e| ReconcileError::Allocation {
                cluster: cluster_name.to_string(),
                reason: e.to_string(),
            })?;
        let allocation = validate(cluster_name, response)?;

        self.cache.insert(cluster_name, &allocation.segment);
        Ok(allocation)
    }

    /// Pure cache lookup. `None` means the MCE has no allocation yet.
    pub fn lookup_mce_segment(&self, mce_name: &str) -> Option<&str> {
        let found = self.cache.get(mce_name);
        match found {
            Some(segment) => debug!(mce = %mce_name, segment = %segment, "MCE segment cache hit"),
            None => debug!(mce = %mce_name, "MCE segment not in cache"),
        }
        found
    }

    pub fn cache(&self) -> &SegmentCache {
        &self.cache
    }

    /// False once a cache warm failed to reach the allocator.
    pub fn is_available(&self) -> bool {
        self.available
    }
}

fn validate(cluster: &str, response: AllocationResponse) -> Result<Allocation, ReconcileError> {
    let incomplete = |reason: &str| ReconcileError::Allocation {
        cluster: cluster.to_string(),
        reason: reason.to_string(),
    };

    let segment = response
        .segment
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| incomplete("response missing segment"))?;
    let vlan_id = match response.vlan_id {
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => return Err(incomplete("response missing vlan_id")),
    }
    .and_then(|v| u32::try_from(v).ok())
    .ok_or_else(|| incomplete("vlan_id is not an unsigned integer"))?;

    Ok(Allocation { segment, vlan_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::mock::MockAllocator;
    use crate::error::AllocatorError;

    #[test]
    fn warm_cache_issues_one_bulk_fetch() {
        let mock = MockAllocator::new()
            .with_segment("mce-a", "10.0.50.0/24")
            .with_segment("mce-b", "10.0.51.0/24");
        let mut resolver = Resolver::new(&mock, "Network1");
        assert_eq!(resolver.warm_cache(), 2);
        assert_eq!(resolver.warm_cache(), 2);
        assert_eq!(mock.bulk_fetches(), 1);
        assert!(resolver.is_available());
    }

    #[test]
    fn warm_cache_skips_incomplete_records() {
        let mut mock = MockAllocator::new().with_segment("mce-a", "10.0.50.0/24");
        mock.segments.push(crate::allocator::SegmentRecord {
            cluster_name: None,
            segment: Some("10.9.9.0/24".into()),
        });
        mock.segments.push(crate::allocator::SegmentRecord {
            cluster_name: Some("mce-x".into()),
            segment: None,
        });
        let mut resolver = Resolver::new(&mock, "Network1");
        assert_eq!(resolver.warm_cache(), 1);
    }

    #[test]
    fn warm_cache_failure_flags_unavailable() {
        let mut mock = MockAllocator::new();
        mock.segments_error = Some(AllocatorError::Timeout("/segments".into()));
        let mut resolver = Resolver::new(&mock, "Network1");
        assert_eq!(resolver.warm_cache(), 0);
        assert!(!resolver.is_available());
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn allocation_refused_after_failed_warm() {
        let mut mock = MockAllocator::new().with_allocation("c", "10.1.0.0/24", 5);
        mock.segments_error = Some(AllocatorError::Connect("/segments".into()));
        let mut resolver = Resolver::new(&mock, "Network1");
        resolver.warm_cache();
        assert!(resolver.allocate_cluster_segment("c", "s").is_err());
        assert_eq!(mock.allocations_for("c"), 0);
    }

    #[test]
    fn allocation_sends_vrf_and_updates_cache() {
        let mock = MockAllocator::new().with_allocation("ocp4-roi", "10.1.100.0/24", 105);
        let mut resolver = Resolver::new(&mock, "Network7");
        resolver.warm_cache();

        let allocation = resolver.allocate_cluster_segment("ocp4-roi", "site1").unwrap();
        assert_eq!(allocation, Allocation { segment: "10.1.100.0/24".into(), vlan_id: 105 });
        assert_eq!(resolver.lookup_mce_segment("ocp4-roi"), Some("10.1.100.0/24"));
        assert_eq!(mock.bulk_fetches(), 1);

        let sent = mock.calls();
        assert!(sent.iter().any(|c| matches!(
            c,
            crate::allocator::mock::AllocatorCall::AllocateVlan(r)
                if r.vrf == "Network7" && r.site == "site1"
        )));
    }

    #[test]
    fn allocation_accepts_string_vlan() {
        let mut mock = MockAllocator::new();
        mock.set_allocation(
            "c",
            Ok(AllocationResponse {
                segment: Some("10.1.0.0/24".into()),
                vlan_id: Some(serde_json::json!("42")),
            }),
        );
        let mut resolver = Resolver::new(&mock, "Network1");
        assert_eq!(resolver.allocate_cluster_segment("c", "s").unwrap().vlan_id, 42);
    }

    #[test]
    fn incomplete_response_is_allocation_error() {
        let mut mock = MockAllocator::new();
        mock.set_allocation(
            "no-vlan",
            Ok(AllocationResponse { segment: Some("10.1.0.0/24".into()), vlan_id: None }),
        );
        mock.set_allocation(
            "no-seg",
            Ok(AllocationResponse { segment: None, vlan_id: Some(serde_json::json!(5)) }),
        );
        mock.set_allocation(
            "bad-vlan",
            Ok(AllocationResponse {
                segment: Some("10.1.0.0/24".into()),
                vlan_id: Some(serde_json::json!("abc")),
            }),
        );
        let mut resolver = Resolver::new(&mock, "Network1");
        for cluster in ["no-vlan", "no-seg", "bad-vlan"] {
            let err = resolver.allocate_cluster_segment(cluster, "s").unwrap_err();
            assert!(matches!(err, ReconcileError::Allocation { .. }), "{}", cluster);
            assert_eq!(resolver.lookup_mce_segment(cluster), None);
        }
    }

    #[test]
    fn transport_failure_is_allocation_error() {
        let mut mock = MockAllocator::new();
        mock.set_allocation("c", Err(AllocatorError::Timeout("/allocate-vlan".into())));
        let mut resolver = Resolver::new(&mock, "Network1");
        let err = resolver.allocate_cluster_segment("c", "s").unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn lookup_never_calls_allocator() {
        let mock = MockAllocator::new();
        let resolver = Resolver::new(&mock, "Network1");
        assert_eq!(resolver.lookup_mce_segment("mce-a"), None);
        assert!(mock.calls().is_empty());
    }
}
