use crate::invoker::ToolInvoker;
use crate::RuntimeError;
use packsmith_schema::RegistrySpec;
use tracing::debug;

/// The `--ref=<value>` qualifier produced by registry registration.
///
/// Appended verbatim to every later invocation of the same operation so that
/// all of them address the registry revision that was just registered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryQualifier(Option<String>);

impl RegistryQualifier {
    pub fn from_ref(git_ref: Option<&str>) -> Self {
        Self(
            git_ref
                .filter(|r| !r.is_empty())
                .map(|r| format!("--ref={r}")),
        )
    }

    /// The qualifier argument, or `""` when no ref is configured.
    pub fn as_str(&self) -> &str {
        self.0.as_deref().unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn append_to(&self, args: &mut Vec<String>) {
        if let Some(ref arg) = self.0 {
            args.push(arg.clone());
        }
    }
}

/// `registry add <name> <source> [--target=T] [--ref=R]`
pub fn registry_add_args(registry: &RegistrySpec) -> (Vec<String>, RegistryQualifier) {
    let mut args = vec![
        "registry".to_owned(),
        "add".to_owned(),
        registry.name.to_string(),
        registry.source.clone(),
    ];
    if let Some(ref target) = registry.target {
        args.push(format!("--target={target}"));
    }
    let qualifier = RegistryQualifier::from_ref(registry.git_ref.as_deref());
    qualifier.append_to(&mut args);
    (args, qualifier)
}

/// Register the pack registry with the tool. Every operation calls this
/// first; the result is never cached across calls.
pub fn add_registry(
    invoker: &dyn ToolInvoker,
    registry: &RegistrySpec,
) -> Result<RegistryQualifier, RuntimeError> {
    let (args, qualifier) = registry_add_args(registry);
    debug!("registering registry {} from {}", registry.name, registry.source);
    invoker.invoke(&args)?;
    Ok(qualifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockInvoker;
    use packsmith_schema::DeploymentSpec;

    fn registry() -> RegistrySpec {
        DeploymentSpec::new("d1", "redis", "r1", "github.com/x/y").registry
    }

    #[test]
    fn plain_registry_add() {
        let (args, qualifier) = registry_add_args(&registry());
        assert_eq!(args, ["registry", "add", "r1", "github.com/x/y"]);
        assert!(qualifier.is_empty());
        assert_eq!(qualifier.as_str(), "");
    }

    #[test]
    fn target_and_ref_are_appended_in_order() {
        let mut reg = registry();
        reg.target = Some("redis".to_owned());
        reg.git_ref = Some("v1.2".to_owned());
        let (args, qualifier) = registry_add_args(&reg);
        assert_eq!(
            args,
            [
                "registry",
                "add",
                "r1",
                "github.com/x/y",
                "--target=redis",
                "--ref=v1.2"
            ]
        );
        assert_eq!(qualifier.as_str(), "--ref=v1.2");
    }

    #[test]
    fn empty_ref_yields_no_qualifier() {
        assert!(RegistryQualifier::from_ref(Some("")).is_empty());
        assert!(RegistryQualifier::from_ref(None).is_empty());
    }

    #[test]
    fn add_registry_invokes_tool_once() {
        let mock = MockInvoker::new();
        let mut reg = registry();
        reg.git_ref = Some("main".to_owned());
        let qualifier = add_registry(&mock, &reg).unwrap();
        assert_eq!(qualifier.as_str(), "--ref=main");
        assert_eq!(
            mock.calls(),
            vec![vec!["registry", "add", "r1", "github.com/x/y", "--ref=main"]]
        );
    }

    #[test]
    fn add_registry_propagates_failure() {
        let mock = MockInvoker::new();
        mock.fail_verb("registry", "repository not found");
        let err = add_registry(&mock, &registry()).unwrap_err();
        assert!(matches!(err, RuntimeError::InvocationFailed { .. }));
    }
}
