//! End-to-end reconciliation over a real sites tree on disk.

use std::path::{Path, PathBuf};

use cluster_netcfg_core::allocator::mock::MockAllocator;
use cluster_netcfg_core::data::scan_clusters;
use cluster_netcfg_core::document::parse_persisted;
use cluster_netcfg_core::store::fs::FsStore;
use cluster_netcfg_core::store::memory::MemoryStore;
use cluster_netcfg_core::{ClusterIdentity, ReconciliationAction, Reconciler};
use tempfile::TempDir;

const MCE_SEG: &str = "10.0.50.0/24";
const CLUSTER_SEG: &str = "10.1.100.0/24";

fn write_cluster(root: &Path, mce: &str, cluster: &str, content: &str) -> PathBuf {
    let dir = root.join("site1/mce-tenant-clusters/mce-prod").join(mce);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{}.yaml", cluster));
    std::fs::write(&path, content).unwrap();
    path
}

fn allocator() -> MockAllocator {
    MockAllocator::new()
        .with_segment("mce-a", MCE_SEG)
        .with_allocation("ocp4-roi", CLUSTER_SEG, 105)
}

fn run(root: &Path, alloc: &MockAllocator) -> cluster_netcfg_core::RunReport {
    let clusters = scan_clusters(root, &[]).unwrap();
    Reconciler::default().run(&clusters, alloc, &mut FsStore::new())
}

#[test]
fn empty_artifact_gets_vlan_and_rule_pair() {
    let dir = TempDir::new().unwrap();
    let path = write_cluster(dir.path(), "mce-a", "ocp4-roi", "");

    let report = run(dir.path(), &allocator());
    assert_eq!(report.results[0].action, ReconciliationAction::Added);

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("vlanId: 105\n"));
    let persisted = parse_persisted(&path, &text).unwrap();
    assert_eq!(persisted.rules.len(), 2);
    assert_eq!(persisted.rules[0].from.segment, MCE_SEG);
    assert_eq!(persisted.rules[0].destination.segment, CLUSTER_SEG);
    assert_eq!(persisted.rules[1].from.segment, CLUSTER_SEG);
    assert_eq!(persisted.rules[1].destination.segment, MCE_SEG);
}

#[test]
fn matching_artifact_is_untouched() {
    let dir = TempDir::new().unwrap();
    let content = "\
name: ocp4-roi
vlanId: 105
Networks:
- number: 2
  from:
    segment: 10.1.100.0/24
  destination:
    segment: 10.0.50.0/24
";
    let path = write_cluster(dir.path(), "mce-a", "ocp4-roi", content);
    let before = std::fs::metadata(&path).unwrap().modified().unwrap();

    let report = run(dir.path(), &allocator());
    assert_eq!(report.results[0].action, ReconciliationAction::NoChange);
    assert!(!report.results[0].written);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), before);
}

#[test]
fn mismatched_vlan_is_replaced() {
    let dir = TempDir::new().unwrap();
    let content = "\
name: ocp4-roi
vlanId: 99
Networks:
- number: 1
  from:
    segment: 10.9.9.0/24
  destention:
    segment: 10.1.100.0/24
labels:
  tier: gold
";
    let path = write_cluster(dir.path(), "mce-a", "ocp4-roi", content);

    let report = run(dir.path(), &allocator());
    assert_eq!(report.results[0].action, ReconciliationAction::Updated);

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("name: ocp4-roi\nlabels:\n  tier: gold\nvlanId: 105\n"));
    assert!(!text.contains("vlanId: 99"));
    assert!(!text.contains("10.9.9.0/24"));
    assert!(!text.contains("destention"));
    assert_eq!(text.matches("Networks:").count(), 1);
}

#[test]
fn missing_mce_segment_writes_vlan_only() {
    let dir = TempDir::new().unwrap();
    let path = write_cluster(dir.path(), "mce-new", "ocp4-roi", "name: ocp4-roi\nNetworks:\n- from:\n    segment: stale\n");
    let alloc = MockAllocator::new().with_allocation("ocp4-roi", CLUSTER_SEG, 105);

    let report = run(dir.path(), &alloc);
    let result = &report.results[0];
    assert_eq!(result.action, ReconciliationAction::Updated);
    assert!(result.is_partial());
    assert_eq!(report.stats.partial, 1);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "name: ocp4-roi\nvlanId: 105\n");
}

#[test]
fn unavailable_allocator_touches_nothing() {
    let dir = TempDir::new().unwrap();
    let path = write_cluster(dir.path(), "mce-a", "ocp4-roi", "name: ocp4-roi\n");

    let report = run(dir.path(), &MockAllocator::unavailable());
    assert!(report.aborted.is_some());
    assert_ne!(report.exit_code(), 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "name: ocp4-roi\n");
}

#[test]
fn opt_out_skips_allocation() {
    let dir = TempDir::new().unwrap();
    write_cluster(dir.path(), "mce-a", "ocp4-roi", "AutomaticAllocation: false\n");
    let alloc = allocator();

    let report = run(dir.path(), &alloc);
    assert_eq!(report.results[0].action, ReconciliationAction::Skipped);
    assert_eq!(alloc.allocations_for("ocp4-roi"), 0);
}

#[test]
fn second_run_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = write_cluster(dir.path(), "mce-a", "ocp4-roi", "# managed by gitops\nname: ocp4-roi\nvlanId: 7\n");
    let alloc = allocator();

    let first = run(dir.path(), &alloc);
    assert_eq!(first.stats.writes, 1);
    let after_first = std::fs::read_to_string(&path).unwrap();

    let second = run(dir.path(), &alloc);
    assert_eq!(second.results[0].action, ReconciliationAction::NoChange);
    assert_eq!(second.stats.writes, 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), after_first);
}

#[test]
fn one_bulk_fetch_per_run_regardless_of_batch_size() {
    for n in [0usize, 1, 7] {
        let mut alloc = MockAllocator::new().with_segment("mce-a", MCE_SEG);
        let mut store = MemoryStore::new();
        let mut clusters = Vec::new();
        for i in 0..n {
            let name = format!("ocp4-c{}", i);
            alloc = alloc.with_allocation(&name, &format!("10.1.{}.0/24", i), 100 + i as u32);
            let c = ClusterIdentity::new(&name, "mce-a", "site1", format!("{}.yaml", name));
            store.insert(&c.artifact, "");
            clusters.push(c);
        }

        let report = Reconciler::default().run(&clusters, &alloc, &mut store);
        assert_eq!(alloc.bulk_fetches(), 1, "batch of {}", n);
        assert_eq!(report.stats.added, n);
    }
}

#[test]
fn unmanaged_lines_survive_byte_for_byte() {
    let dir = TempDir::new().unwrap();
    let unmanaged = [
        "# cluster definition\r\n",
        "name: ocp4-roi\r\n",
        "spec:\r\n",
        "  vlanId: nested-and-unmanaged\r\n",
        "  replicas: 3\r\n",
        "\r\n",
        "annotations:\r\n",
        "  - \"quoted: value\"\r\n",
    ];
    let mut content = String::new();
    content.push_str(unmanaged[0]);
    content.push_str(unmanaged[1]);
    content.push_str("vlanId: 1\r\n");
    for line in &unmanaged[2..] {
        content.push_str(line);
    }
    let path = write_cluster(dir.path(), "mce-a", "ocp4-roi", &content);

    run(dir.path(), &allocator());
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with(&unmanaged.concat()));
}
