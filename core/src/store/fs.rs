//! Filesystem store with atomic replace.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::ArtifactStore;

#[derive(Debug, Default, Clone, Copy)]
pub struct FsStore;

impl FsStore {
    pub fn new() -> Self {
        FsStore
    }
}

/// Sibling temp path: `dir/.name.cnc-tmp`.
fn temp_path(path: &Path) -> io::Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "artifact path has no file name"))?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(name);
    tmp_name.push(".cnc-tmp");
    Ok(path.with_file_name(tmp_name))
}

fn write_synced(path: &Path, content: &str) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()
}

impl ArtifactStore for FsStore {
    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&mut self, path: &Path, content: &str) -> io::Result<()> {
        let tmp = temp_path(path)?;
        let result = write_synced(&tmp, content).and_then(|()| std::fs::rename(&tmp, path));
        if result.is_err() {
            let _ = std::fs::remove_file(&tmp);
        }
        result
    }
}
