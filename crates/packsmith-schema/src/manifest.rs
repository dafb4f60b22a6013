use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("unsupported manifest_version: {0}, expected 1")]
    UnsupportedVersion(u32),
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("invalid deployment name '{name}': {reason}")]
    InvalidDeploymentName { name: String, reason: String },
    #[error("invalid variable '{name}': {reason}")]
    InvalidVariable { name: String, reason: String },
}

/// On-disk deployment manifest (`packsmith.toml`).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DeploymentManifest {
    pub manifest_version: u32,
    pub deployment: DeploymentSection,
    pub registry: RegistrySection,
    #[serde(default)]
    pub variables: BTreeMap<String, toml::Value>,
    #[serde(default)]
    pub tool: ToolSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DeploymentSection {
    pub name: String,
    pub pack: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variable_files: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RegistrySection {
    pub name: String,
    pub source: String,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ToolSection {
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_binary")]
    pub binary: String,
}

impl Default for ToolSection {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            binary: default_binary(),
        }
    }
}

fn default_backend() -> String {
    "command".to_owned()
}

pub fn default_binary() -> String {
    "nomad-pack".to_owned()
}

pub fn parse_manifest_str(input: &str) -> Result<DeploymentManifest, ManifestError> {
    Ok(toml::from_str(input)?)
}

pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<DeploymentManifest, ManifestError> {
    let content = fs::read_to_string(path)?;
    parse_manifest_str(&content)
}
