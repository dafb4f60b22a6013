use super::{ensure_tool, json_pretty, load_spec, lock_deployment, TerminalOutput, EXIT_SUCCESS};
use packsmith_core::Engine;
use std::path::Path;

pub fn run(engine: &Engine, manifest: &Path, json: bool) -> Result<u8, String> {
    let spec = load_spec(manifest)?;
    ensure_tool(&spec)?;
    let _lock = lock_deployment(engine, &spec.deployment_name)?;

    let out = TerminalOutput::new(json, "deploying pack...");
    let result = match engine.deploy(&spec, &out) {
        Ok(r) => {
            out.finish_ok("pack deployed");
            r
        }
        Err(e) => {
            out.finish_fail("deploy failed");
            return Err(e.to_string());
        }
    };

    if json {
        let payload = serde_json::json!({
            "deployment": result.record.deployment_name,
            "pack": result.state.pack_name,
            "registry": result.record.registry,
            "state": result.record.state.to_string(),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "deployed pack '{}' as '{}'",
            result.state.pack_name, result.record.deployment_name
        );
    }
    Ok(EXIT_SUCCESS)
}
