use crate::concurrency::DeploymentLock;
use crate::controller::{Controller, DestroyOutcome};
use crate::lifecycle::validate_transition;
use crate::output::UserOutput;
use crate::report::StatusReport;
use crate::CoreError;
use packsmith_runtime::{select_invoker, ToolInvoker};
use packsmith_schema::{parse_manifest_file, DeploymentSpec};
use packsmith_store::{
    save_state, DeploymentRecord, DeploymentState, RecordStore, ResourceState, StoreError,
    StoreLayout,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Host for the lifecycle controller on top of the on-disk record store.
///
/// The engine owns deployment bookkeeping: it records lifecycle state around
/// each controller call, persists the resource state blob after a deploy, and
/// hands it back on status and destroy. Callers hold a [`DeploymentLock`]
/// around each operation.
pub struct Engine {
    layout: StoreLayout,
    records: RecordStore,
    /// Overrides the invoker selected from each manifest's `[tool]` section.
    invoker: Option<Box<dyn ToolInvoker>>,
}

/// Result of a successful deploy.
pub struct DeployResult {
    pub record: DeploymentRecord,
    pub state: ResourceState,
}

pub struct StatusResult {
    pub report: StatusReport,
    /// `None` when the deployment was made by another host.
    pub record: Option<DeploymentRecord>,
    /// The manifest changed since the recorded deploy.
    pub drifted: bool,
}

/// Parse and validate a deployment manifest.
pub fn load_manifest(manifest_path: &Path) -> Result<DeploymentSpec, CoreError> {
    let manifest = parse_manifest_file(manifest_path)?;
    Ok(manifest.normalize()?)
}

impl Engine {
    /// Create an engine rooted at the given store directory.
    ///
    /// Records left in `creating` or `destroying` by an interrupted process
    /// are rolled back on construction, unless another process holds the
    /// deployment's lock.
    pub fn new(store_root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = store_root.into();
        let layout = StoreLayout::new(&root);
        let records = RecordStore::new(layout.clone());
        let engine = Self {
            layout,
            records,
            invoker: None,
        };
        engine.recover_interrupted();
        engine
    }

    /// Like [`Engine::new`], but every operation uses `invoker` regardless of
    /// the manifest's `[tool]` section.
    pub fn with_invoker(store_root: impl Into<PathBuf>, invoker: Box<dyn ToolInvoker>) -> Self {
        let mut engine = Self::new(store_root);
        engine.invoker = Some(invoker);
        engine
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    fn recover_interrupted(&self) {
        if !self.layout.is_initialized() {
            return;
        }
        let records = match self.records.list() {
            Ok(records) => records,
            Err(e) => {
                warn!("record scan failed; skipping recovery: {e}");
                return;
            }
        };

        for record in records {
            if !matches!(
                record.state,
                DeploymentState::Creating | DeploymentState::Destroying
            ) {
                continue;
            }
            let name = record.deployment_name.as_str();
            match DeploymentLock::try_acquire(&self.layout, name) {
                Ok(Some(_lock)) => self.roll_back(name),
                Ok(None) => debug!("'{name}' is locked; leaving its {} record", record.state),
                Err(e) => warn!("lock check for '{name}' failed: {e}"),
            }
        }
    }

    /// Undo an interrupted operation. The caller holds the deployment lock, so
    /// the record is read again: the scan may predate a finished operation.
    fn roll_back(&self, name: &str) {
        let record = match self.find(name) {
            Ok(Some(record)) => record,
            Ok(None) => return,
            Err(e) => {
                warn!("failed to re-read '{name}' for recovery: {e}");
                return;
            }
        };
        // A redeploy keeps the previous state blob, so its pack is still deployed.
        let rollback = match record.state {
            DeploymentState::Creating if record.resource_state.is_some() => {
                DeploymentState::Present
            }
            DeploymentState::Creating => DeploymentState::Absent,
            DeploymentState::Destroying => DeploymentState::Present,
            DeploymentState::Absent | DeploymentState::Present => return,
        };
        debug!("rolling back interrupted '{name}': {} -> {rollback}", record.state);
        let result = if rollback == DeploymentState::Absent {
            self.records.remove(name)
        } else {
            self.records.update_state(name, rollback)
        };
        if let Err(e) = result {
            warn!("failed to roll back '{name}': {e}");
        }
    }

    fn controller_run<R>(
        &self,
        spec: &DeploymentSpec,
        output: &dyn UserOutput,
        op: impl FnOnce(&Controller<'_>) -> Result<R, CoreError>,
    ) -> Result<R, CoreError> {
        if let Some(ref invoker) = self.invoker {
            return op(&Controller::new(invoker.as_ref(), output));
        }
        let invoker = select_invoker(&spec.tool.backend, &spec.tool.binary)?;
        debug!("using {} invoker for {}", invoker.name(), spec.deployment_name);
        op(&Controller::new(invoker.as_ref(), output))
    }

    fn find(&self, name: &str) -> Result<Option<DeploymentRecord>, CoreError> {
        match self.records.get(name) {
            Ok(record) => Ok(Some(record)),
            Err(StoreError::DeploymentNotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Deploy (or redeploy) the pack described by `spec`.
    ///
    /// A failed create leaves the store as it was before the call: a new
    /// deployment gets no record, a redeploy keeps its previous record.
    pub fn deploy(
        &self,
        spec: &DeploymentSpec,
        output: &dyn UserOutput,
    ) -> Result<DeployResult, CoreError> {
        let name = spec.deployment_name.as_str();
        info!("deploying {name}");
        self.layout.initialize()?;

        let previous = self.find(name)?;
        let from = previous
            .as_ref()
            .map_or(DeploymentState::Absent, |r| r.state);
        validate_transition(from, DeploymentState::Creating)?;

        let mut creating = previous
            .clone()
            .unwrap_or_else(|| DeploymentRecord::new(spec, DeploymentState::Creating));
        creating.state = DeploymentState::Creating;
        creating.updated_at = chrono::Utc::now().to_rfc3339();
        self.records.put(&creating)?;

        let state = match self.controller_run(spec, output, |c| c.create(spec)) {
            Ok(state) => state,
            Err(e) => {
                let rollback = match previous {
                    Some(ref prev) => self.records.put(prev),
                    None => self.records.remove(name),
                };
                if let Err(re) = rollback {
                    warn!("failed to roll back record for '{name}': {re}");
                }
                return Err(e);
            }
        };

        validate_transition(DeploymentState::Creating, DeploymentState::Present)?;
        let blob = save_state(&state)?;
        let mut record = DeploymentRecord::new(spec, DeploymentState::Present);
        if let Some(prev) = previous {
            record.created_at = prev.created_at;
        }
        record.resource_state = Some(
            String::from_utf8(blob)
                .map_err(|e| CoreError::Internal(format!("resource state is not UTF-8: {e}")))?,
        );
        self.records.put(&record)?;

        Ok(DeployResult { record, state })
    }

    /// Check the deployment. A deployment with no record is checked through
    /// the legacy path, with the pack name taken from the deployment name.
    pub fn status(
        &self,
        spec: &DeploymentSpec,
        output: &dyn UserOutput,
    ) -> Result<StatusResult, CoreError> {
        let record = self.find(&spec.deployment_name)?;
        if record.is_none() {
            debug!("no record for '{}', using legacy state", spec.deployment_name);
        }

        let persisted = record.as_ref().and_then(DeploymentRecord::resource_state_bytes);
        let report = self.controller_run(spec, output, |c| c.status(spec, persisted))?;

        let drifted = record.as_ref().is_some_and(|r| r.drifted_from(spec));
        if drifted {
            warn!(
                "manifest for '{}' changed since it was deployed",
                spec.deployment_name
            );
        }

        Ok(StatusResult {
            report,
            record,
            drifted,
        })
    }

    /// Destroy the deployment. The record is removed on success and returned
    /// to `present` on failure.
    pub fn destroy(
        &self,
        spec: &DeploymentSpec,
        output: &dyn UserOutput,
    ) -> Result<DestroyOutcome, CoreError> {
        let name = spec.deployment_name.as_str();
        info!("destroying {name}");

        let record = self.find(name)?;
        if let Some(ref r) = record {
            validate_transition(r.state, DeploymentState::Destroying)?;
            self.records.update_state(name, DeploymentState::Destroying)?;
        }

        let persisted = record.as_ref().and_then(DeploymentRecord::resource_state_bytes);
        match self.controller_run(spec, output, |c| c.destroy(spec, persisted)) {
            Ok(outcome) => {
                if record.is_some() {
                    validate_transition(DeploymentState::Destroying, DeploymentState::Absent)?;
                    self.records.remove(name)?;
                }
                Ok(outcome)
            }
            Err(e) => {
                if record.is_some() {
                    if let Err(re) = self.records.update_state(name, DeploymentState::Present) {
                        warn!("failed to restore record for '{name}': {re}");
                    }
                }
                Err(e)
            }
        }
    }

    /// Query the current generation and remember it on the record, if any.
    pub fn generation(
        &self,
        spec: &DeploymentSpec,
        output: &dyn UserOutput,
    ) -> Result<Option<Vec<u8>>, CoreError> {
        let generation = self.controller_run(spec, output, |c| c.generation(spec))?;

        if let Some(mut record) = self.find(&spec.deployment_name)? {
            record.generation = generation
                .as_deref()
                .map(|g| String::from_utf8_lossy(g).into_owned());
            record.updated_at = chrono::Utc::now().to_rfc3339();
            self.records.put(&record)?;
        }
        Ok(generation)
    }

    pub fn inspect(&self, name: &str) -> Result<DeploymentRecord, CoreError> {
        self.find(name)?
            .ok_or_else(|| CoreError::DeploymentNotFound(name.to_owned()))
    }

    pub fn list(&self) -> Result<Vec<DeploymentRecord>, CoreError> {
        Ok(self.records.list()?)
    }
}
