//! Resource state persistence and deployment bookkeeping for packsmith.
//!
//! This crate provides the storage layer: the versioned, checksummed
//! `ResourceState` blob that a host round-trips between lifecycle calls,
//! `RecordStore` for per-deployment records on disk, and `StoreLayout` for
//! directory structure and format-version management.

pub mod layout;
pub mod record;
pub mod state;

pub use layout::{StoreLayout, STORE_FORMAT_VERSION};
pub use record::{DeploymentRecord, DeploymentState, RecordStore};
pub use state::{load_state, save_state, ResourceState, STATE_SCHEMA_VERSION};

use std::path::Path;
use thiserror::Error;

/// Fsync a directory to ensure that a preceding `rename()` is durable.
///
/// POSIX does not guarantee rename durability without syncing the parent
/// directory, so every atomic write in this crate ends with this call.
pub(crate) fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("integrity check failed for '{subject}': expected {expected}, got {actual}")]
    IntegrityFailure {
        subject: String,
        expected: String,
        actual: String,
    },
    #[error("deployment not found: {0}")]
    DeploymentNotFound(String),
    #[error("store format version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("resource state schema version {found} is newer than supported version {supported}")]
    UnsupportedStateVersion { supported: u32, found: u32 },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid deployment name: {0}")]
    InvalidName(String),
}
