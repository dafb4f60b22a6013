use crate::deployment::DeploymentSpec;
use crate::types::SpecDigest;

/// Digest of everything that shapes the tool invocations for a deployment.
///
/// Stored alongside a deployment record so a later `status` can tell whether
/// the manifest changed since the pack was deployed.
pub fn compute_spec_digest(spec: &DeploymentSpec) -> SpecDigest {
    let mut hasher = blake3::Hasher::new();

    hasher.update(format!("deployment:{}", spec.deployment_name).as_bytes());
    hasher.update(format!("pack:{}", spec.pack).as_bytes());
    hasher.update(format!("registry:{}:{}", spec.registry.name, spec.registry.source).as_bytes());
    if let Some(ref git_ref) = spec.registry.git_ref {
        hasher.update(format!("ref:{git_ref}").as_bytes());
    }
    if let Some(ref target) = spec.registry.target {
        hasher.update(format!("target:{target}").as_bytes());
    }
    for (name, value) in &spec.variables {
        hasher.update(format!("var:{name}={value}").as_bytes());
    }
    for file in &spec.variable_files {
        hasher.update(format!("var-file:{file}").as_bytes());
    }

    SpecDigest::new(hasher.finalize().to_hex().to_string())
}
