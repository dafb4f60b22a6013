use crate::output::UserOutput;
use crate::report::StatusReport;
use crate::resource::{ManagedResource, OperationContext, PackResource};
use crate::CoreError;
use packsmith_runtime::ToolInvoker;
use packsmith_schema::DeploymentSpec;
use packsmith_store::{load_state, ResourceState};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DestroyOutcome {
    /// Nothing matched the deployment; no destroy was issued.
    Skipped,
    Destroyed,
}

/// Drives the managed resources of one deployment through the tool.
///
/// Holds no deployment spec and no cached registration: every call takes the
/// spec explicitly and registers the registry again. Calls are synchronous
/// and issue one tool invocation at a time.
pub struct Controller<'a> {
    invoker: &'a dyn ToolInvoker,
    output: &'a dyn UserOutput,
    resources: Vec<Box<dyn ManagedResource>>,
}

impl<'a> Controller<'a> {
    /// A controller managing the single pack resource.
    pub fn new(invoker: &'a dyn ToolInvoker, output: &'a dyn UserOutput) -> Self {
        Self::with_resources(invoker, output, vec![Box::new(PackResource)])
    }

    pub fn with_resources(
        invoker: &'a dyn ToolInvoker,
        output: &'a dyn UserOutput,
        resources: Vec<Box<dyn ManagedResource>>,
    ) -> Self {
        Self {
            invoker,
            output,
            resources,
        }
    }

    pub fn resource_names(&self) -> Vec<&'static str> {
        self.resources.iter().map(|r| r.name()).collect()
    }

    fn context<'s>(&'s self, spec: &'s DeploymentSpec) -> OperationContext<'s> {
        OperationContext {
            spec,
            invoker: self.invoker,
            output: self.output,
        }
    }

    /// Create every resource in order. On failure nothing is returned, so the
    /// host records no state.
    pub fn create(&self, spec: &DeploymentSpec) -> Result<ResourceState, CoreError> {
        info!("deploying pack {} as {}", spec.pack, spec.deployment_name);
        self.output.step("Deploying pack...");
        let ctx = self.context(spec);

        let mut state = ResourceState::default();
        for resource in &self.resources {
            debug!("creating resource {}", resource.name());
            resource.create(&ctx, &mut state)?;
        }

        if !state.is_populated() {
            return Err(CoreError::Internal(
                "pack state is empty after a successful create".to_owned(),
            ));
        }
        Ok(state)
    }

    /// Check every resource. `persisted` is the blob saved after create, or
    /// `None` for deployments that predate persisted state.
    pub fn status(
        &self,
        spec: &DeploymentSpec,
        persisted: Option<&[u8]>,
    ) -> Result<StatusReport, CoreError> {
        info!("checking status of {}", spec.deployment_name);
        self.output.step("Checking the status of the deployment...");
        let state = load_state(persisted, &spec.deployment_name)?;
        let ctx = self.context(spec);

        let mut statuses = Vec::with_capacity(self.resources.len());
        for resource in &self.resources {
            statuses.push(resource.status(&ctx, &state)?);
        }
        Ok(StatusReport::from_resources(statuses))
    }

    /// Destroy resources in reverse creation order.
    pub fn destroy(
        &self,
        spec: &DeploymentSpec,
        persisted: Option<&[u8]>,
    ) -> Result<DestroyOutcome, CoreError> {
        info!("destroying {}", spec.deployment_name);
        self.output.step("Destroying pack...");
        let state = load_state(persisted, &spec.deployment_name)?;
        let ctx = self.context(spec);

        let mut outcome = DestroyOutcome::Skipped;
        for resource in self.resources.iter().rev() {
            if resource.destroy(&ctx, &state)? == DestroyOutcome::Destroyed {
                outcome = DestroyOutcome::Destroyed;
            }
        }
        Ok(outcome)
    }

    /// The first generation reported by any resource.
    pub fn generation(&self, spec: &DeploymentSpec) -> Result<Option<Vec<u8>>, CoreError> {
        let ctx = self.context(spec);
        for resource in &self.resources {
            if let Some(generation) = resource.generation(&ctx)? {
                return Ok(Some(generation));
            }
        }
        Ok(None)
    }
}
