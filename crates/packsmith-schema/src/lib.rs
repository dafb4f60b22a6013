//! Deployment manifest parsing, validation, and identity for packsmith.
//!
//! This crate defines the schema layer: TOML manifest parsing
//! (`DeploymentManifest`), the validated `DeploymentSpec` every lifecycle
//! operation receives, string newtypes for identifiers, and the
//! `compute_spec_digest` fingerprint used to detect manifest drift.

pub mod deployment;
pub mod identity;
pub mod manifest;
pub mod types;

pub use deployment::{validate_deployment_name, DeploymentSpec, RegistrySpec, ToolSpec};
pub use identity::compute_spec_digest;
pub use manifest::{
    default_binary, parse_manifest_file, parse_manifest_str, DeploymentManifest,
    DeploymentSection, ManifestError, RegistrySection, ToolSection, MANIFEST_VERSION,
};
pub use types::{DeploymentName, PackName, RegistryName, SpecDigest};
