use super::{ensure_tool, json_pretty, load_spec, lock_deployment, TerminalOutput, EXIT_SUCCESS};
use packsmith_core::Engine;
use std::path::Path;

pub fn run(engine: &Engine, manifest: &Path, json: bool) -> Result<u8, String> {
    let spec = load_spec(manifest)?;
    ensure_tool(&spec)?;
    let _lock = lock_deployment(engine, &spec.deployment_name)?;

    // No spinner: the generation is usually consumed by scripts.
    let out = TerminalOutput::new(true, "");
    let generation = engine
        .generation(&spec, &out)
        .map_err(|e| e.to_string())?
        .map(|g| String::from_utf8_lossy(&g).into_owned());

    if json {
        let payload = serde_json::json!({
            "deployment": spec.deployment_name,
            "generation": generation,
        });
        println!("{}", json_pretty(&payload)?);
    } else if let Some(generation) = generation {
        println!("{generation}");
    } else {
        eprintln!("no pack deployed as '{}'", spec.deployment_name);
    }
    Ok(EXIT_SUCCESS)
}
