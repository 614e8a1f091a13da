use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::allocator::DEFAULT_VRF;
use crate::error::ReconcileError;

pub const DEFAULT_API_URL: &str = "http://0.0.0.0:8000/api";

/// Run configuration. Every field has a default, so a settings file only
/// needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub api_url: String,
    pub vrf: String,
    pub sites_dir: PathBuf,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub health_timeout_ms: u64,
    /// MCE directories left out of discovery entirely.
    pub skip_mces: Vec<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_url: DEFAULT_API_URL.into(),
            vrf: DEFAULT_VRF.into(),
            sites_dir: PathBuf::from("sites"),
            connect_timeout_ms: 5000,
            read_timeout_ms: 10000,
            health_timeout_ms: 3000,
            skip_mces: Vec::new(),
            username: None,
            password: None,
        }
    }
}

impl Settings {
    /// Replace `api_url` with a non-blank override.
    pub fn with_api_url_override(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = url;
        }
        self
    }
}

/// Load `Settings` from a YAML file.
pub fn load(path: &Path) -> Result<Settings, ReconcileError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ReconcileError::Settings(format!("cannot read {}: {}", path.display(), e)))?;
    parse(&content)
}

/// Parse settings from a YAML string. An empty document yields defaults.
pub fn parse(content: &str) -> Result<Settings, ReconcileError> {
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(content).map_err(|e| ReconcileError::Settings(e.to_string()))
}
