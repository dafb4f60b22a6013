use crate::manifest::{DeploymentManifest, ManifestError, MANIFEST_VERSION};
use crate::types::{DeploymentName, PackName, RegistryName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Validated, immutable description of one deployment.
///
/// Every controller operation receives the spec explicitly; nothing about a
/// deployment is remembered between calls except the persisted resource state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentSpec {
    pub deployment_name: DeploymentName,
    pub pack: PackName,
    pub registry: RegistrySpec,
    /// Variable overrides. Emitted in key order, which keeps argv deterministic.
    pub variables: BTreeMap<String, String>,
    pub variable_files: Vec<String>,
    pub tool: ToolSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrySpec {
    pub name: RegistryName,
    pub source: String,
    pub git_ref: Option<String>,
    pub target: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolSpec {
    pub backend: String,
    pub binary: String,
}

impl Default for ToolSpec {
    fn default() -> Self {
        Self {
            backend: "command".to_owned(),
            binary: crate::manifest::default_binary(),
        }
    }
}

impl DeploymentSpec {
    pub fn new(
        deployment_name: impl Into<DeploymentName>,
        pack: impl Into<PackName>,
        registry_name: impl Into<RegistryName>,
        registry_source: impl Into<String>,
    ) -> Self {
        Self {
            deployment_name: deployment_name.into(),
            pack: pack.into(),
            registry: RegistrySpec {
                name: registry_name.into(),
                source: registry_source.into(),
                git_ref: None,
                target: None,
            },
            variables: BTreeMap::new(),
            variable_files: Vec::new(),
            tool: ToolSpec::default(),
        }
    }

    #[must_use]
    pub fn with_ref(mut self, git_ref: &str) -> Self {
        self.registry.git_ref = Some(git_ref.to_owned());
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: &str) -> Self {
        self.registry.target = Some(target.to_owned());
        self
    }

    #[must_use]
    pub fn with_variable(mut self, name: &str, value: &str) -> Self {
        self.variables.insert(name.to_owned(), value.to_owned());
        self
    }

    #[must_use]
    pub fn with_variable_file(mut self, path: &str) -> Self {
        self.variable_files.push(path.to_owned());
        self
    }

    #[must_use]
    pub fn with_backend(mut self, backend: &str) -> Self {
        backend.clone_into(&mut self.tool.backend);
        self
    }
}

/// Deployment names double as record file names, so they are restricted.
pub fn validate_deployment_name(name: &str) -> Result<(), ManifestError> {
    let invalid = |reason: &str| ManifestError::InvalidDeploymentName {
        name: name.to_owned(),
        reason: reason.to_owned(),
    };
    if name.is_empty() || name.len() > 64 {
        return Err(invalid("must be 1-64 characters"));
    }
    if name.starts_with('.') {
        return Err(invalid("must not start with '.'"));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.')
    {
        return Err(invalid("must match [a-zA-Z0-9_.-]"));
    }
    Ok(())
}

fn non_empty(value: &str, field: &'static str) -> Result<String, ManifestError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ManifestError::EmptyField(field));
    }
    Ok(trimmed.to_owned())
}

fn optional(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn variable_value(name: &str, value: &toml::Value) -> Result<String, ManifestError> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        other => Err(ManifestError::InvalidVariable {
            name: name.to_owned(),
            reason: format!("unsupported value type '{}'", other.type_str()),
        }),
    }
}

impl DeploymentManifest {
    /// Validate the manifest and resolve it into a [`DeploymentSpec`].
    pub fn normalize(&self) -> Result<DeploymentSpec, ManifestError> {
        if self.manifest_version != MANIFEST_VERSION {
            return Err(ManifestError::UnsupportedVersion(self.manifest_version));
        }

        let deployment_name = non_empty(&self.deployment.name, "deployment.name")?;
        validate_deployment_name(&deployment_name)?;
        let pack = non_empty(&self.deployment.pack, "deployment.pack")?;
        let registry_name = non_empty(&self.registry.name, "registry.name")?;
        let source = non_empty(&self.registry.source, "registry.source")?;

        let mut variables = BTreeMap::new();
        for (name, value) in &self.variables {
            if name.trim().is_empty() {
                return Err(ManifestError::InvalidVariable {
                    name: name.clone(),
                    reason: "name must not be empty".to_owned(),
                });
            }
            if name.contains('=') {
                return Err(ManifestError::InvalidVariable {
                    name: name.clone(),
                    reason: "name must not contain '='".to_owned(),
                });
            }
            variables.insert(name.clone(), variable_value(name, value)?);
        }

        let mut variable_files = Vec::with_capacity(self.deployment.variable_files.len());
        for file in &self.deployment.variable_files {
            variable_files.push(non_empty(file, "deployment.variable_files entry")?);
        }

        Ok(DeploymentSpec {
            deployment_name: DeploymentName::new(deployment_name),
            pack: PackName::new(pack),
            registry: RegistrySpec {
                name: RegistryName::new(registry_name),
                source,
                git_ref: optional(self.registry.git_ref.as_ref()),
                target: optional(self.registry.target.as_ref()),
            },
            variables,
            variable_files,
            tool: ToolSpec {
                backend: self.tool.backend.trim().to_lowercase(),
                binary: non_empty(&self.tool.binary, "tool.binary")?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::parse_manifest_str;

    fn manifest(extra_registry: &str, extra: &str) -> String {
        format!(
            r#"
manifest_version = 1

[deployment]
name = "d1"
pack = "redis"

[registry]
name = "r1"
source = "github.com/x/y"
{extra_registry}
{extra}
"#
        )
    }

    #[test]
    fn normalize_resolves_defaults() {
        let spec = parse_manifest_str(&manifest("", ""))
            .unwrap()
            .normalize()
            .unwrap();
        assert_eq!(spec.deployment_name, "d1");
        assert_eq!(spec.pack, "redis");
        assert_eq!(spec.registry.name, "r1");
        assert_eq!(spec.registry.source, "github.com/x/y");
        assert!(spec.registry.git_ref.is_none());
        assert_eq!(spec.tool.backend, "command");
        assert_eq!(spec.tool.binary, "nomad-pack");
    }

    #[test]
    fn empty_ref_and_target_are_absent() {
        let spec = parse_manifest_str(&manifest("ref = \"\"\ntarget = \"  \"", ""))
            .unwrap()
            .normalize()
            .unwrap();
        assert!(spec.registry.git_ref.is_none());
        assert!(spec.registry.target.is_none());
    }

    #[test]
    fn non_string_variables_are_stringified() {
        let spec = parse_manifest_str(&manifest(
            "",
            "[variables]\nreplicas = 3\nenabled = true\nimage = \"redis:7\"",
        ))
        .unwrap()
        .normalize()
        .unwrap();
        assert_eq!(spec.variables["replicas"], "3");
        assert_eq!(spec.variables["enabled"], "true");
        assert_eq!(spec.variables["image"], "redis:7");
    }

    #[test]
    fn table_variables_are_rejected() {
        let err = parse_manifest_str(&manifest("", "[variables.nested]\na = \"b\""))
            .unwrap()
            .normalize()
            .unwrap_err();
        assert!(matches!(err, ManifestError::InvalidVariable { .. }));
    }

    #[test]
    fn variable_name_with_equals_is_rejected() {
        let err = parse_manifest_str(&manifest("", "[variables]\n\"a=b\" = \"c\""))
            .unwrap()
            .normalize()
            .unwrap_err();
        assert!(err.to_string().contains("must not contain '='"));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let input = manifest("", "").replace("manifest_version = 1", "manifest_version = 2");
        let err = parse_manifest_str(&input).unwrap().normalize().unwrap_err();
        assert!(matches!(err, ManifestError::UnsupportedVersion(2)));
    }

    #[test]
    fn empty_pack_is_rejected() {
        let input = manifest("", "").replace("pack = \"redis\"", "pack = \" \"");
        let err = parse_manifest_str(&input).unwrap().normalize().unwrap_err();
        assert!(matches!(err, ManifestError::EmptyField("deployment.pack")));
    }

    #[test]
    fn validate_deployment_name_rules() {
        assert!(validate_deployment_name("d1").is_ok());
        assert!(validate_deployment_name("web_api-2.prod").is_ok());
        assert!(validate_deployment_name(&"x".repeat(64)).is_ok());
        assert!(validate_deployment_name("").is_err());
        assert!(validate_deployment_name(&"x".repeat(65)).is_err());
        assert!(validate_deployment_name("has space").is_err());
        assert!(validate_deployment_name("has/slash").is_err());
        assert!(validate_deployment_name(".hidden").is_err());
    }

    #[test]
    fn builder_matches_normalized_manifest() {
        let from_manifest = parse_manifest_str(&manifest(
            "ref = \"main\"",
            "[variables]\nreplicas = \"3\"",
        ))
        .unwrap()
        .normalize()
        .unwrap();
        let built = DeploymentSpec::new("d1", "redis", "r1", "github.com/x/y")
            .with_ref("main")
            .with_variable("replicas", "3");
        assert_eq!(from_manifest, built);
    }
}
