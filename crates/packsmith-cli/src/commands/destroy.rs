use super::{ensure_tool, json_pretty, load_spec, lock_deployment, TerminalOutput, EXIT_SUCCESS};
use packsmith_core::{DestroyOutcome, Engine};
use std::path::Path;

pub fn run(engine: &Engine, manifest: &Path, json: bool) -> Result<u8, String> {
    let spec = load_spec(manifest)?;
    ensure_tool(&spec)?;
    let _lock = lock_deployment(engine, &spec.deployment_name)?;

    let out = TerminalOutput::new(json, "destroying pack...");
    let outcome = match engine.destroy(&spec, &out) {
        Ok(outcome) => {
            out.finish_ok("destroy complete");
            outcome
        }
        Err(e) => {
            out.finish_fail("destroy failed");
            return Err(e.to_string());
        }
    };

    if json {
        let payload = serde_json::json!({
            "deployment": spec.deployment_name,
            "outcome": outcome,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        match outcome {
            DestroyOutcome::Destroyed => println!("destroyed '{}'", spec.deployment_name),
            DestroyOutcome::Skipped => {
                println!("nothing deployed as '{}'", spec.deployment_name);
            }
        }
    }
    Ok(EXIT_SUCCESS)
}
