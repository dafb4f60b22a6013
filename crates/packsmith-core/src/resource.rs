//! Managed resources and the pack resource.
//!
//! A managed resource knows how to create, check, and destroy one kind of
//! remote object through the tool. Every operation registers the pack
//! registry first, so a fresh host can act on a deployment it has never seen.

use crate::controller::DestroyOutcome;
use crate::output::UserOutput;
use crate::report::ResourceStatus;
use crate::CoreError;
use packsmith_runtime::{
    add_registry, classify, destroy_args, parse_status, run_args, status_args, RegistryQualifier,
    RuntimeError, StatusLookup, ToolInvoker,
};
use packsmith_schema::DeploymentSpec;
use packsmith_store::ResourceState;
use tracing::{debug, info};

/// Everything one operation needs. Built fresh per call; nothing is cached.
pub struct OperationContext<'a> {
    pub spec: &'a DeploymentSpec,
    pub invoker: &'a dyn ToolInvoker,
    pub output: &'a dyn UserOutput,
}

pub trait ManagedResource {
    /// Stable resource kind name.
    fn name(&self) -> &'static str;

    /// Create the resource and record its identity in `state`.
    fn create(
        &self,
        ctx: &OperationContext<'_>,
        state: &mut ResourceState,
    ) -> Result<(), CoreError>;

    fn destroy(
        &self,
        ctx: &OperationContext<'_>,
        state: &ResourceState,
    ) -> Result<DestroyOutcome, CoreError>;

    fn status(
        &self,
        ctx: &OperationContext<'_>,
        state: &ResourceState,
    ) -> Result<ResourceStatus, CoreError>;

    /// Opaque identifier of the currently deployed generation, if the
    /// resource has one.
    fn generation(&self, _ctx: &OperationContext<'_>) -> Result<Option<Vec<u8>>, CoreError> {
        Ok(None)
    }
}

/// A pack deployed through the tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackResource;

pub const PACK_RESOURCE_NAME: &str = "nomad_pack";

/// Show partial tool output and a summary line on the error sink.
fn report_failure(output: &dyn UserOutput, action: &str, err: &RuntimeError) {
    if let Some(partial) = err.partial_output() {
        output.error(&String::from_utf8_lossy(partial));
    }
    output.error(&format!("Error {action}: {err}"));
}

fn register(ctx: &OperationContext<'_>) -> Result<RegistryQualifier, CoreError> {
    add_registry(ctx.invoker, &ctx.spec.registry).map_err(|e| {
        report_failure(ctx.output, "adding pack registry", &e);
        CoreError::from(e)
    })
}

fn invoke(ctx: &OperationContext<'_>, args: &[String], action: &str) -> Result<String, CoreError> {
    match ctx.invoker.invoke(args) {
        Ok(out) => Ok(String::from_utf8_lossy(&out).into_owned()),
        Err(e) => {
            report_failure(ctx.output, action, &e);
            Err(e.into())
        }
    }
}

fn parse(ctx: &OperationContext<'_>, raw: &str) -> Result<StatusLookup, CoreError> {
    parse_status(raw).map_err(|e| {
        report_failure(ctx.output, "getting pack status", &e);
        CoreError::from(e)
    })
}

/// `status` for the configured pack, with the raw output only logged.
fn lookup_configured(
    ctx: &OperationContext<'_>,
    qualifier: &RegistryQualifier,
) -> Result<StatusLookup, CoreError> {
    let raw = invoke(
        ctx,
        &status_args(&ctx.spec.pack, ctx.spec, qualifier),
        "getting pack status",
    )?;
    info!("{}", raw.trim_end());
    parse(ctx, &raw)
}

impl ManagedResource for PackResource {
    fn name(&self) -> &'static str {
        PACK_RESOURCE_NAME
    }

    fn create(
        &self,
        ctx: &OperationContext<'_>,
        state: &mut ResourceState,
    ) -> Result<(), CoreError> {
        let qualifier = register(ctx)?;
        let out = invoke(ctx, &run_args(ctx.spec, &qualifier), "running pack")?;
        ctx.output.info(&out);
        state.pack_name = ctx.spec.pack.to_string();
        debug!("pack {} deployed as {}", ctx.spec.pack, ctx.spec.deployment_name);
        Ok(())
    }

    fn destroy(
        &self,
        ctx: &OperationContext<'_>,
        state: &ResourceState,
    ) -> Result<DestroyOutcome, CoreError> {
        debug!(
            "destroying {} (recorded pack {})",
            ctx.spec.deployment_name, state.pack_name
        );
        let qualifier = register(ctx)?;

        if !lookup_configured(ctx, &qualifier)?.is_found() {
            info!("no pack to destroy, skipping redundant destroy operation");
            ctx.output
                .info("No pack to destroy, skipping redundant destroy operation");
            return Ok(DestroyOutcome::Skipped);
        }

        let out = invoke(ctx, &destroy_args(ctx.spec, &qualifier), "destroying pack")?;
        ctx.output.info(&out);
        Ok(DestroyOutcome::Destroyed)
    }

    fn status(
        &self,
        ctx: &OperationContext<'_>,
        state: &ResourceState,
    ) -> Result<ResourceStatus, CoreError> {
        let qualifier = register(ctx)?;
        let raw = invoke(
            ctx,
            &status_args(&state.pack_name, ctx.spec, &qualifier),
            "getting pack status",
        )?;
        ctx.output.info(&raw);

        let StatusLookup::Found(record) = parse(ctx, &raw)? else {
            return Err(CoreError::PackNotFound {
                deployment: ctx.spec.deployment_name.to_string(),
            });
        };

        let health = classify(&record.status);
        Ok(ResourceStatus {
            id: state.pack_name.clone(),
            name: state.pack_name.clone(),
            kind: PACK_RESOURCE_NAME.to_owned(),
            created_at: chrono::Utc::now(),
            health,
            health_message: health.message().to_owned(),
            state_json: serde_json::to_string(&record)?,
        })
    }

    /// The job name of the deployed pack.
    fn generation(&self, ctx: &OperationContext<'_>) -> Result<Option<Vec<u8>>, CoreError> {
        let qualifier = register(ctx)?;
        Ok(lookup_configured(ctx, &qualifier)?
            .into_record()
            .map(|record| record.job_name.into_bytes()))
    }
}
