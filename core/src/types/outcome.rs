//! Per-artifact results and run-level aggregation.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// What reconciliation decided (or failed to do) for one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReconciliationAction {
    NoChange,
    Added,
    Updated,
    Skipped,
    Error,
}

impl ReconciliationAction {
    /// Whether the rewriter has work to do for this action.
    pub fn requires_write(self) -> bool {
        matches!(self, ReconciliationAction::Added | ReconciliationAction::Updated)
    }
}

impl fmt::Display for ReconciliationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReconciliationAction::NoChange => "no_change",
            ReconciliationAction::Added => "added",
            ReconciliationAction::Updated => "updated",
            ReconciliationAction::Skipped => "skipped",
            ReconciliationAction::Error => "error",
        };
        f.write_str(s)
    }
}

/// Outcome record for a single artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactResult {
    pub cluster_name: String,
    pub artifact: PathBuf,
    pub action: ReconciliationAction,
    pub vlan_id: Option<u32>,
    pub cluster_segment: Option<String>,
    pub mce_segment: Option<String>,
    pub message: Option<String>,
    /// Whether the artifact was actually written this run.
    pub written: bool,
    pub elapsed: Duration,
}

impl ArtifactResult {
    pub fn new(cluster_name: &str, artifact: PathBuf, action: ReconciliationAction) -> Self {
        ArtifactResult {
            cluster_name: cluster_name.to_string(),
            artifact,
            action,
            vlan_id: None,
            cluster_segment: None,
            mce_segment: None,
            message: None,
            written: false,
            elapsed: Duration::ZERO,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// A decision was made without an MCE segment, so only `vlanId` applies.
    pub fn is_partial(&self) -> bool {
        matches!(
            self.action,
            ReconciliationAction::NoChange | ReconciliationAction::Added | ReconciliationAction::Updated
        ) && self.mce_segment.is_none()
    }
}

/// Counts by outcome category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub unchanged: usize,
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
    pub partial: usize,
    pub writes: usize,
}

impl RunStats {
    pub fn record(&mut self, result: &ArtifactResult) {
        match result.action {
            ReconciliationAction::NoChange => self.unchanged += 1,
            ReconciliationAction::Added => self.added += 1,
            ReconciliationAction::Updated => self.updated += 1,
            ReconciliationAction::Skipped => self.skipped += 1,
            ReconciliationAction::Error => self.errors += 1,
        }
        if result.is_partial() {
            self.partial += 1;
        }
        if result.written {
            self.writes += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.unchanged + self.added + self.updated + self.skipped + self.errors
    }
}

/// Everything one reconciliation pass produced.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub results: Vec<ArtifactResult>,
    pub stats: RunStats,
    pub dry_run: bool,
    /// Set when the pre-flight health check failed and nothing was attempted.
    pub aborted: Option<String>,
}

impl RunReport {
    pub fn push(&mut self, result: ArtifactResult) {
        self.stats.record(&result);
        self.results.push(result);
    }

    pub fn errors(&self) -> impl Iterator<Item = &ArtifactResult> {
        self.results
            .iter()
            .filter(|r| r.action == ReconciliationAction::Error)
    }

    /// Non-zero when the run aborted or any artifact ended in `Error`.
    pub fn exit_code(&self) -> i32 {
        if self.aborted.is_some() || self.stats.errors > 0 {
            1
        } else {
            0
        }
    }
}
