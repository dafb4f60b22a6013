//! Core orchestration for packsmith deployments.
//!
//! This crate ties together manifest parsing, resource state persistence, and
//! tool invocation. The `Controller` drives a set of managed resources through
//! create, status, destroy, and generation against a caller-supplied invoker
//! and output sink; the `Engine` hosts it on top of the on-disk record store
//! with lifecycle state validation and per-deployment locking.

pub mod concurrency;
pub mod controller;
pub mod engine;
pub mod lifecycle;
pub mod output;
pub mod report;
pub mod resource;

pub use concurrency::DeploymentLock;
pub use controller::{Controller, DestroyOutcome};
pub use engine::{load_manifest, DeployResult, Engine, StatusResult};
pub use lifecycle::validate_transition;
pub use output::{NullOutput, OutputKind, OutputLine, RecordingOutput, UserOutput};
pub use report::{ResourceStatus, StatusReport};
pub use resource::{ManagedResource, OperationContext, PackResource};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("manifest error: {0}")]
    Manifest(#[from] packsmith_schema::ManifestError),
    #[error("store error: {0}")]
    Store(#[from] packsmith_store::StoreError),
    #[error("runtime error: {0}")]
    Runtime(#[from] packsmith_runtime::RuntimeError),
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
    #[error("deployment not found: {0}")]
    DeploymentNotFound(String),
    #[error("no pack deployed for '{deployment}'")]
    PackNotFound { deployment: String },
    #[error("internal error: {0}")]
    Internal(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
