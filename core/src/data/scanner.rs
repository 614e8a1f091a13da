use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ReconcileError;
use crate::types::ClusterIdentity;

/// Tenant directory names, tried in order under each site.
pub const TENANT_DIR_VARIANTS: [&str; 2] = ["mce-tenant-clusters", "mce-tenant-cluster"];
/// Environments scanned under the tenant directory.
pub const MCE_ENVIRONMENTS: [&str; 2] = ["mce-prod", "mce-prep"];

const CLUSTER_PREFIX: &str = "ocp4-";
const CLUSTER_SUFFIX: &str = ".yaml";
/// Ancestors between a cluster file and its site directory.
const SITE_LEVEL_UP: usize = 4;

/// Find every cluster artifact under
/// `<sites>/<site>/<tenant-dir>/<env>/<mce>/ocp4-*.yaml`.
pub fn scan_clusters(sites_dir: &Path, skip_mces: &[String]) -> Result<Vec<ClusterIdentity>, ReconcileError> {
    if !sites_dir.is_dir() {
        return Err(ReconcileError::Discovery(format!(
            "sites directory '{}' not found",
            sites_dir.display()
        )));
    }

    let mut clusters = Vec::new();
    for site_dir in subdirs(sites_dir)? {
        let Some(tenant_dir) = TENANT_DIR_VARIANTS
            .iter()
            .map(|v| site_dir.join(v))
            .find(|p| p.is_dir())
        else {
            continue;
        };

        for env in MCE_ENVIRONMENTS {
            let env_dir = tenant_dir.join(env);
            if !env_dir.is_dir() {
                continue;
            }
            for mce_dir in subdirs(&env_dir)? {
                let mce = dir_name(&mce_dir);
                if skip_mces.iter().any(|s| *s == mce) {
                    info!(mce = %mce, "skipping MCE listed in skip_mces");
                    continue;
                }
                for file in cluster_files(&mce_dir)? {
                    clusters.push(identity_from_path(&file)?);
                }
            }
        }
    }

    clusters.sort_by(|a, b| a.artifact.cmp(&b.artifact));
    Ok(clusters)
}

/// Derive an identity from a bare artifact path: cluster is the file stem,
/// MCE the parent directory, site the fourth ancestor.
pub fn identity_from_path(path: &Path) -> Result<ClusterIdentity, ReconcileError> {
    let missing = |what| ReconcileError::Identity { path: path.to_path_buf(), what };

    let cluster = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| missing("cluster name"))?;
    let mce = path
        .parent()
        .and_then(Path::file_name)
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| missing("MCE name"))?;
    let site = path
        .ancestors()
        .nth(SITE_LEVEL_UP)
        .and_then(Path::file_name)
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| missing("site"))?;

    Ok(ClusterIdentity::new(cluster, mce, site, path))
}

fn subdirs(dir: &Path) -> Result<Vec<PathBuf>, ReconcileError> {
    let mut out: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| ReconcileError::Discovery(format!("cannot read {}: {}", dir.display(), e)))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    out.sort();
    Ok(out)
}

fn cluster_files(dir: &Path) -> Result<Vec<PathBuf>, ReconcileError> {
    let out = std::fs::read_dir(dir)
        .map_err(|e| ReconcileError::Discovery(format!("cannot read {}: {}", dir.display(), e)))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            let name = dir_name(p);
            name.starts_with(CLUSTER_PREFIX) && name.ends_with(CLUSTER_SUFFIX)
        })
        .collect();
    Ok(out)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
