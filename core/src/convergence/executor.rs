//! Reconciliation pass: runs every discovered artifact through resolve,
//! decide and rewrite, sequentially.

use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::allocator::{Allocator, DEFAULT_VRF};
use crate::convergence::planner::decide;
use crate::document::{automatic_allocation_enabled, is_multi_document, parse_persisted, rewrite};
use crate::error::ReconcileError;
use crate::resolver::Resolver;
use crate::store::ArtifactStore;
use crate::types::{
    ArtifactResult, ClusterIdentity, DesiredState, PersistedState, ReconciliationAction, RunReport,
};

/// Executes one pass over a batch of artifacts. Per-artifact failures end
/// up in that artifact's result; only a failed pre-flight health check
/// stops the pass.
pub struct Reconciler {
    vrf: String,
    dry_run: bool,
}

impl Reconciler {
    pub fn new(vrf: impl Into<String>) -> Self {
        Reconciler {
            vrf: vrf.into(),
            dry_run: false,
        }
    }

    /// Decide without writing.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn run(
        &self,
        clusters: &[ClusterIdentity],
        allocator: &dyn Allocator,
        store: &mut dyn ArtifactStore,
    ) -> RunReport {
        let mut report = RunReport {
            dry_run: self.dry_run,
            ..RunReport::default()
        };

        if let Err(e) = allocator.health() {
            let err = ReconcileError::AllocatorUnavailable {
                url: allocator.describe(),
                reason: e.to_string(),
            };
            error!(error = %err, "cannot proceed without allocator access");
            report.aborted = Some(err.to_string());
            return report;
        }
        info!(url = %allocator.describe(), "allocator is available");

        let mut resolver = Resolver::new(allocator, self.vrf.clone());
        let cached = resolver.warm_cache();
        if !resolver.is_available() {
            error!("cannot fetch segments, allocations will be refused");
        } else if cached == 0 {
            warn!("no segments found in allocator");
        } else {
            info!(segments = cached, "cached allocated segments");
        }

        let total = clusters.len();
        for (i, identity) in clusters.iter().enumerate() {
            if (i + 1) % 10 == 0 || i + 1 == total {
                info!("processing cluster {}/{}", i + 1, total);
            }
            let started = Instant::now();
            let mut result = match self.reconcile_one(identity, &mut resolver, store) {
                Ok(result) => result,
                Err(e) => {
                    error!(cluster = %identity.cluster_name, error = %e, "reconciliation failed");
                    ArtifactResult::new(&identity.cluster_name, identity.artifact.clone(), ReconciliationAction::Error)
                        .with_message(e.to_string())
                }
            };
            result.elapsed = started.elapsed();
            report.push(result);
        }

        report
    }

    fn reconcile_one(
        &self,
        identity: &ClusterIdentity,
        resolver: &mut Resolver<'_>,
        store: &mut dyn ArtifactStore,
    ) -> Result<ArtifactResult, ReconcileError> {
        let path = identity.artifact.as_path();
        let text = store.read(path).map_err(|source| ReconcileError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        if is_multi_document(&text) {
            return Err(ReconcileError::MultiDocument {
                path: path.to_path_buf(),
            });
        }
        if !automatic_allocation_enabled(&text) {
            info!(cluster = %identity.cluster_name, "skipped, automatic allocation disabled");
            return Ok(
                ArtifactResult::new(&identity.cluster_name, path.to_path_buf(), ReconciliationAction::Skipped)
                    .with_message(ReconcileError::OptedOut.to_string()),
            );
        }

        info!(
            cluster = %identity.cluster_name,
            mce = %identity.mce_name,
            site = %identity.site,
            "processing cluster"
        );
        let allocation = resolver.allocate_cluster_segment(&identity.cluster_name, &identity.site)?;
        let desired = DesiredState {
            vlan_id: allocation.vlan_id,
            cluster_segment: allocation.segment,
            mce_segment: resolver.lookup_mce_segment(&identity.mce_name).map(String::from),
        };
        if desired.is_partial() {
            warn!(mce = %identity.mce_name, "MCE segment not found, will write vlanId only");
        }
        let persisted = parse_persisted(path, &text).unwrap_or_else(|e| {
            warn!(error = %e, "treating unparseable artifact as empty");
            PersistedState::empty()
        });
        let action = decide(&desired, &persisted);

        let mut result = ArtifactResult::new(&identity.cluster_name, path.to_path_buf(), action);
        result.vlan_id = Some(desired.vlan_id);
        result.cluster_segment = Some(desired.cluster_segment.clone());
        result.mce_segment = desired.mce_segment.clone();

        if !action.requires_write() {
            info!(cluster = %identity.cluster_name, vlan_id = desired.vlan_id, "already up-to-date");
            return Ok(result);
        }

        let new_text = rewrite(&text, &desired, identity)?;
        if self.dry_run {
            info!(cluster = %identity.cluster_name, vlan_id = desired.vlan_id, "dry-run: would {}", action);
            debug!("intended content:\n{}", new_text);
            return Ok(result);
        }

        store.write(path, &new_text).map_err(|source| ReconcileError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        result.written = true;
        info!(cluster = %identity.cluster_name, vlan_id = desired.vlan_id, "{}", action);
        Ok(result)
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Reconciler::new(DEFAULT_VRF)
    }
}
