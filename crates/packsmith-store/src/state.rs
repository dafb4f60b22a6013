//! The persisted identity of one deployed pack instance.
//!
//! A host stores the bytes produced by [`save_state`] with its deployment
//! record and hands them back on the next status or destroy call. Blobs are
//! versioned and checksummed; hosts that deployed before state was persisted
//! pass nothing and get a state reconstructed from the deployment name.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Current resource state schema version.
pub const STATE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    pub pack_name: String,
}

impl ResourceState {
    pub fn new(pack_name: impl Into<String>) -> Self {
        Self {
            pack_name: pack_name.into(),
        }
    }

    /// State for a deployment that predates persisted resource state.
    pub fn legacy(deployment_name: &str) -> Self {
        Self::new(deployment_name)
    }

    pub fn is_populated(&self) -> bool {
        !self.pack_name.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateEnvelope {
    /// Absent in blobs written before versioning; those decode as version 0.
    #[serde(default)]
    schema_version: u32,
    #[serde(alias = "name")]
    pack_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    checksum: Option<String>,
}

impl StateEnvelope {
    fn compute_checksum(&self) -> Result<String, StoreError> {
        let mut copy = self.clone();
        copy.checksum = None;
        let json = serde_json::to_string(&copy)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

pub fn save_state(state: &ResourceState) -> Result<Vec<u8>, StoreError> {
    let mut envelope = StateEnvelope {
        schema_version: STATE_SCHEMA_VERSION,
        pack_name: state.pack_name.clone(),
        checksum: None,
    };
    envelope.checksum = Some(envelope.compute_checksum()?);
    Ok(serde_json::to_vec(&envelope)?)
}

/// Decode a persisted state blob, or reconstruct one when none was recorded.
///
/// An absent or empty blob is not an error: the pack name defaults to the
/// deployment name. Anything else must decode, carry a supported version,
/// and match its checksum when one is present.
pub fn load_state(
    persisted: Option<&[u8]>,
    deployment_name: &str,
) -> Result<ResourceState, StoreError> {
    let bytes = match persisted {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => {
            debug!("no persisted resource state for '{deployment_name}', reconstructing");
            return Ok(ResourceState::legacy(deployment_name));
        }
    };

    let envelope: StateEnvelope = serde_json::from_slice(bytes)?;
    if envelope.schema_version > STATE_SCHEMA_VERSION {
        return Err(StoreError::UnsupportedStateVersion {
            supported: STATE_SCHEMA_VERSION,
            found: envelope.schema_version,
        });
    }

    if let Some(ref expected) = envelope.checksum {
        let actual = envelope.compute_checksum()?;
        if actual != *expected {
            return Err(StoreError::IntegrityFailure {
                subject: format!("resource state of '{deployment_name}'"),
                expected: expected.clone(),
                actual,
            });
        }
    }

    Ok(ResourceState {
        pack_name: envelope.pack_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_keeps_pack_name() {
        let blob = save_state(&ResourceState::new("redis")).unwrap();
        let state = load_state(Some(&blob), "d1").unwrap();
        assert_eq!(state.pack_name, "redis");
    }

    #[test]
    fn saved_blob_is_versioned_and_checksummed() {
        let blob = save_state(&ResourceState::new("redis")).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&blob).unwrap();
        assert_eq!(value["schema_version"], STATE_SCHEMA_VERSION);
        assert!(value["checksum"].is_string());
    }

    #[test]
    fn missing_state_reconstructs_from_deployment_name() {
        let state = load_state(None, "d1").unwrap();
        assert_eq!(state, ResourceState::legacy("d1"));
        assert_eq!(state.pack_name, "d1");
    }

    #[test]
    fn empty_blob_is_treated_as_missing() {
        let state = load_state(Some(b""), "d1").unwrap();
        assert_eq!(state.pack_name, "d1");
    }

    #[test]
    fn unversioned_blob_loads() {
        let state = load_state(Some(br#"{"name": "redis"}"#), "d1").unwrap();
        assert_eq!(state.pack_name, "redis");
    }

    #[test]
    fn corrupt_blob_is_an_error() {
        let err = load_state(Some(b"NOT JSON"), "d1").unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn tampered_blob_fails_checksum() {
        let blob = save_state(&ResourceState::new("redis")).unwrap();
        let tampered = String::from_utf8(blob).unwrap().replace("redis", "mysql");
        let err = load_state(Some(tampered.as_bytes()), "d1").unwrap_err();
        assert!(matches!(err, StoreError::IntegrityFailure { .. }));
    }

    #[test]
    fn newer_schema_version_is_rejected() {
        let blob = br#"{"schema_version": 9, "pack_name": "redis"}"#;
        let err = load_state(Some(blob), "d1").unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnsupportedStateVersion { found: 9, .. }
        ));
    }

    #[test]
    fn default_state_is_unpopulated() {
        assert!(!ResourceState::default().is_populated());
        assert!(ResourceState::new("redis").is_populated());
    }
}
