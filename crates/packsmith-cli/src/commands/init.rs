use super::{json_pretty, EXIT_SUCCESS};
use packsmith_schema::{
    parse_manifest_str, DeploymentManifest, DeploymentSection, RegistrySection, ToolSection,
    MANIFEST_VERSION,
};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct InitOptions {
    pub name: String,
    pub pack: String,
    pub registry: String,
    pub source: String,
    pub git_ref: Option<String>,
    pub target: Option<String>,
}

fn build_manifest(options: &InitOptions) -> DeploymentManifest {
    DeploymentManifest {
        manifest_version: MANIFEST_VERSION,
        deployment: DeploymentSection {
            name: options.name.clone(),
            pack: options.pack.clone(),
            variable_files: Vec::new(),
        },
        registry: RegistrySection {
            name: options.registry.clone(),
            source: options.source.clone(),
            git_ref: options.git_ref.clone(),
            target: options.target.clone(),
        },
        variables: BTreeMap::new(),
        tool: ToolSection::default(),
    }
}

/// Render and validate the manifest text. Validation goes through the same
/// parser `deploy` uses, so `init` never writes a manifest `deploy` rejects.
fn render(options: &InitOptions) -> Result<String, String> {
    let text = toml::to_string_pretty(&build_manifest(options))
        .map_err(|e| format!("TOML serialization failed: {e}"))?;
    parse_manifest_str(&text)
        .and_then(|m| m.normalize())
        .map_err(|e| format!("manifest error: {e}"))?;
    Ok(text)
}

fn write_atomic(dest: &Path, content: &str) -> Result<(), String> {
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| format!("write temp file: {e}"))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| format!("write temp file: {e}"))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| format!("fsync temp file: {e}"))?;
    tmp.persist(dest)
        .map_err(|e| format!("persist manifest: {}", e.error))?;
    Ok(())
}

pub fn run(options: &InitOptions, dest: &Path, force: bool, json: bool) -> Result<u8, String> {
    if dest.exists() && !force {
        return Err(format!(
            "refusing to overwrite existing {} (pass --force)",
            dest.display()
        ));
    }

    let text = render(options)?;
    write_atomic(dest, &text)?;

    if json {
        let payload = serde_json::json!({
            "status": "written",
            "path": dest.display().to_string(),
            "deployment": options.name,
            "pack": options.pack,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "wrote {} for pack '{}' deployed as '{}'",
            dest.display(),
            options.pack,
            options.name
        );
    }
    Ok(EXIT_SUCCESS)
}
