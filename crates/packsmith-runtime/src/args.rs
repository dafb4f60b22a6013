//! Argument vectors for the tool's pack verbs.
//!
//! Flags always follow the positional pack name. Variables are emitted in key
//! order and variable files in declaration order.

use crate::registry::RegistryQualifier;
use packsmith_schema::DeploymentSpec;

fn push_var_args(spec: &DeploymentSpec, args: &mut Vec<String>) {
    for (name, value) in &spec.variables {
        args.push(format!("--var={name}={value}"));
    }
    for file in &spec.variable_files {
        args.push(format!("--var-file={file}"));
    }
}

/// `run <pack> --name=<d> --registry=<r> [--ref=R] [--var=K=V ...] [--var-file=F ...]`
pub fn run_args(spec: &DeploymentSpec, qualifier: &RegistryQualifier) -> Vec<String> {
    let mut args = vec![
        "run".to_owned(),
        spec.pack.to_string(),
        format!("--name={}", spec.deployment_name),
        format!("--registry={}", spec.registry.name),
    ];
    qualifier.append_to(&mut args);
    push_var_args(spec, &mut args);
    args
}

/// `status <pack> --registry=<r> --name=<d> [--ref=R]`
///
/// The pack is passed separately because status checks address the pack
/// recorded in resource state, which may differ from the configured one.
pub fn status_args(
    pack: &str,
    spec: &DeploymentSpec,
    qualifier: &RegistryQualifier,
) -> Vec<String> {
    let mut args = vec![
        "status".to_owned(),
        pack.to_owned(),
        format!("--registry={}", spec.registry.name),
        format!("--name={}", spec.deployment_name),
    ];
    qualifier.append_to(&mut args);
    args
}

/// `destroy <pack> --name=<d> --registry=<r> [--ref=R] [--var=K=V ...] [--var-file=F ...]`
pub fn destroy_args(spec: &DeploymentSpec, qualifier: &RegistryQualifier) -> Vec<String> {
    let mut args = vec![
        "destroy".to_owned(),
        spec.pack.to_string(),
        format!("--name={}", spec.deployment_name),
        format!("--registry={}", spec.registry.name),
    ];
    qualifier.append_to(&mut args);
    push_var_args(spec, &mut args);
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> DeploymentSpec {
        DeploymentSpec::new("d1", "redis", "r1", "github.com/x/y")
    }

    #[test]
    fn run_args_with_variable() {
        let spec = spec().with_variable("replicas", "3");
        assert_eq!(
            run_args(&spec, &RegistryQualifier::default()),
            ["run", "redis", "--name=d1", "--registry=r1", "--var=replicas=3"]
        );
    }

    #[test]
    fn run_args_full() {
        let spec = spec()
            .with_variable("zone", "b")
            .with_variable("image", "redis:7")
            .with_variable_file("prod.hcl")
            .with_variable_file("extra.hcl");
        let q = RegistryQualifier::from_ref(Some("v1"));
        assert_eq!(
            run_args(&spec, &q),
            [
                "run",
                "redis",
                "--name=d1",
                "--registry=r1",
                "--ref=v1",
                "--var=image=redis:7",
                "--var=zone=b",
                "--var-file=prod.hcl",
                "--var-file=extra.hcl",
            ]
        );
    }

    #[test]
    fn status_args_never_carry_variables() {
        let spec = spec().with_variable("replicas", "3");
        let q = RegistryQualifier::from_ref(Some("v1"));
        assert_eq!(
            status_args("redis", &spec, &q),
            ["status", "redis", "--registry=r1", "--name=d1", "--ref=v1"]
        );
    }

    #[test]
    fn status_args_use_given_pack() {
        assert_eq!(
            status_args("legacy", &spec(), &RegistryQualifier::default())[1],
            "legacy"
        );
    }

    #[test]
    fn destroy_args_mirror_run_args() {
        let spec = spec().with_variable("replicas", "3").with_variable_file("f.hcl");
        let q = RegistryQualifier::from_ref(Some("v1"));
        assert_eq!(
            destroy_args(&spec, &q),
            [
                "destroy",
                "redis",
                "--name=d1",
                "--registry=r1",
                "--ref=v1",
                "--var=replicas=3",
                "--var-file=f.hcl",
            ]
        );
    }
}
