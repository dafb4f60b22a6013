use crate::layout::StoreLayout;
use crate::{fsync_dir, StoreError};
use packsmith_schema::{
    compute_spec_digest, validate_deployment_name, DeploymentName, DeploymentSpec, PackName,
    RegistryName, SpecDigest,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeploymentState {
    Absent,
    Creating,
    Present,
    Destroying,
}

impl std::fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentState::Absent => write!(f, "absent"),
            DeploymentState::Creating => write!(f, "creating"),
            DeploymentState::Present => write!(f, "present"),
            DeploymentState::Destroying => write!(f, "destroying"),
        }
    }
}

/// Host-side bookkeeping for one deployment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentRecord {
    pub deployment_name: DeploymentName,
    pub pack: PackName,
    pub registry: RegistryName,
    pub state: DeploymentState,
    /// Serialized resource state blob. `None` for records written before
    /// resource state was persisted.
    #[serde(default)]
    pub resource_state: Option<String>,
    /// Last generation observed from the tool (the job name).
    #[serde(default)]
    pub generation: Option<String>,
    #[serde(default)]
    pub spec_digest: Option<SpecDigest>,
    pub created_at: String,
    pub updated_at: String,
    /// blake3 checksum for integrity verification. `None` for legacy records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl DeploymentRecord {
    pub fn new(spec: &DeploymentSpec, state: DeploymentState) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            deployment_name: spec.deployment_name.clone(),
            pack: spec.pack.clone(),
            registry: spec.registry.name.clone(),
            state,
            resource_state: None,
            generation: None,
            spec_digest: Some(compute_spec_digest(spec)),
            created_at: now.clone(),
            updated_at: now,
            checksum: None,
        }
    }

    pub fn resource_state_bytes(&self) -> Option<&[u8]> {
        self.resource_state.as_deref().map(str::as_bytes)
    }

    /// True when the manifest no longer matches what was deployed.
    pub fn drifted_from(&self, spec: &DeploymentSpec) -> bool {
        self.spec_digest
            .as_ref()
            .is_some_and(|d| *d != compute_spec_digest(spec))
    }

    fn compute_checksum(&self) -> Result<String, StoreError> {
        let mut copy = self.clone();
        copy.checksum = None;
        let json = serde_json::to_string_pretty(&copy)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

pub struct RecordStore {
    layout: StoreLayout,
}

impl RecordStore {
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    fn checked_name(name: &str) -> Result<&str, StoreError> {
        validate_deployment_name(name).map_err(|e| StoreError::InvalidName(e.to_string()))?;
        Ok(name)
    }

    pub fn put(&self, record: &DeploymentRecord) -> Result<(), StoreError> {
        let name = Self::checked_name(&record.deployment_name)?;
        let dir = self.layout.records_dir();
        fs::create_dir_all(&dir)?;
        let dest = dir.join(name);

        let mut with_checksum = record.clone();
        with_checksum.checksum = Some(with_checksum.compute_checksum()?);
        let content = serde_json::to_string_pretty(&with_checksum)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&dest).map_err(|e| StoreError::Io(e.error))?;
        fsync_dir(&dir)?;

        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<DeploymentRecord, StoreError> {
        let path = self.layout.records_dir().join(Self::checked_name(name)?);
        if !path.exists() {
            return Err(StoreError::DeploymentNotFound(name.to_owned()));
        }
        let content = fs::read_to_string(&path)?;
        let record: DeploymentRecord = serde_json::from_str(&content)?;

        if let Some(ref expected) = record.checksum {
            let actual = record.compute_checksum()?;
            if actual != *expected {
                return Err(StoreError::IntegrityFailure {
                    subject: name.to_owned(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        Ok(record)
    }

    pub fn exists(&self, name: &str) -> bool {
        Self::checked_name(name).is_ok() && self.layout.records_dir().join(name).exists()
    }

    pub fn update_state(&self, name: &str, new_state: DeploymentState) -> Result<(), StoreError> {
        let mut record = self.get(name)?;
        record.state = new_state;
        record.updated_at = chrono::Utc::now().to_rfc3339();
        self.put(&record)
    }

    pub fn remove(&self, name: &str) -> Result<(), StoreError> {
        let path = self.layout.records_dir().join(Self::checked_name(name)?);
        if path.exists() {
            fs::remove_file(path)?;
            fsync_dir(&self.layout.records_dir())?;
        }
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<DeploymentRecord>, StoreError> {
        let mut results = Vec::new();
        for entry in self.list_with_errors()? {
            match entry {
                Ok(record) => results.push(record),
                Err((name, e)) => {
                    tracing::warn!("skipping corrupted deployment record '{name}': {e}");
                }
            }
        }
        Ok(results)
    }

    /// Like `list()`, but returns per-entry `Result`s so callers (e.g.
    /// `doctor`) can surface individual corruption errors.
    #[allow(clippy::type_complexity)]
    pub fn list_with_errors(
        &self,
    ) -> Result<Vec<Result<DeploymentRecord, (String, StoreError)>>, StoreError> {
        let dir = self.layout.records_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if !name.starts_with('.') {
                    names.push(name);
                }
            }
        }
        names.sort();
        Ok(names
            .into_iter()
            .map(|name| self.get(&name).map_err(|e| (name, e)))
            .collect())
    }
}
