//! Run inputs: settings and cluster discovery.

pub mod scanner;
pub mod settings;

pub use scanner::{identity_from_path, scan_clusters};
pub use settings::Settings;
