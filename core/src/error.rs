//! Error taxonomy for a reconciliation run.
//!
//! Only `AllocatorUnavailable` is fatal for a run. Every other variant is
//! caught per artifact and folded into that artifact's result.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReconcileError>;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("allocator unavailable at {url}: {reason}")]
    AllocatorUnavailable { url: String, reason: String },

    #[error("allocation failed for {cluster}: {reason}")]
    Allocation { cluster: String, reason: String },

    #[error("cannot parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} holds more than one YAML document")]
    MultiDocument { path: PathBuf },

    #[error("AutomaticAllocation set to false")]
    OptedOut,

    #[error("cannot derive {what} from {path}")]
    Identity { path: PathBuf, what: &'static str },

    #[error("discovery failed: {0}")]
    Discovery(String),

    #[error("settings error: {0}")]
    Settings(String),
}

/// Transport-level failures reported by an `Allocator` implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AllocatorError {
    #[error("timeout calling {0}")]
    Timeout(String),

    #[error("connection error calling {0}")]
    Connect(String),

    #[error("HTTP {status} from {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("invalid response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
}
