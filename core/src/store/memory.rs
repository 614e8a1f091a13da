//! In-memory store for testing.
//!
//! Counts writes and can be told to fail writes for chosen paths, so
//! orchestration tests can assert on exactly what was persisted.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use super::ArtifactStore;

pub struct MemoryStore {
    pub files: HashMap<PathBuf, String>,
    /// Paths whose writes fail with `PermissionDenied`.
    pub fail_writes: HashSet<PathBuf>,
    /// Every successful write, in order.
    pub writes: Vec<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            files: HashMap::new(),
            fail_writes: HashSet::new(),
            writes: Vec::new(),
        }
    }

    /// Pre-load an artifact.
    pub fn insert(&mut self, path: impl Into<PathBuf>, content: &str) {
        self.files.insert(path.into(), content.to_string());
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(|s| s.as_str())
    }

    pub fn fail_writes_to(&mut self, path: impl Into<PathBuf>) {
        self.fail_writes.insert(path.into());
    }

    /// Clear recorded writes, keeping file contents.
    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactStore for MemoryStore {
    fn read(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("mock: no artifact '{}'", path.display())))
    }

    fn write(&mut self, path: &Path, content: &str) -> io::Result<()> {
        if self.fail_writes.contains(path) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "mock: write refused"));
        }
        self.files.insert(path.to_path_buf(), content.to_string());
        self.writes.push(path.to_path_buf());
        Ok(())
    }
}
