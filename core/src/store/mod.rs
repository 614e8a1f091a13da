//! Artifact storage backends.
//!
//! Provides the `ArtifactStore` trait with a filesystem implementation
//! (production) and an in-memory one (testing).

pub mod fs;
pub mod memory;

use std::io;
use std::path::Path;

/// Read and replace whole artifacts.
pub trait ArtifactStore {
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Replace the artifact. Either the old or the new content is visible
    /// afterwards, never a mix.
    fn write(&mut self, path: &Path, content: &str) -> io::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::fs::FsStore;
    use super::memory::MemoryStore;

    #[test]
    fn stores_implement_artifact_store() {
        let _: &dyn ArtifactStore = &FsStore::new();
        let _: &dyn ArtifactStore = &MemoryStore::new();
    }
}
