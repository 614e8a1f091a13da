use std::path::PathBuf;

/// Who a cluster artifact belongs to and where it lives.
///
/// Produced by discovery and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterIdentity {
    pub cluster_name: String,
    pub mce_name: String,
    pub site: String,
    pub artifact: PathBuf,
}

impl ClusterIdentity {
    pub fn new(
        cluster_name: impl Into<String>,
        mce_name: impl Into<String>,
        site: impl Into<String>,
        artifact: impl Into<PathBuf>,
    ) -> Self {
        ClusterIdentity {
            cluster_name: cluster_name.into(),
            mce_name: mce_name.into(),
            site: site.into(),
            artifact: artifact.into(),
        }
    }
}
