use super::{
    colorize_health, ensure_tool, json_pretty, load_spec, lock_deployment, TerminalOutput,
    EXIT_SUCCESS,
};
use packsmith_core::Engine;
use std::path::Path;

pub fn run(engine: &Engine, manifest: &Path, json: bool) -> Result<u8, String> {
    let spec = load_spec(manifest)?;
    ensure_tool(&spec)?;
    let _lock = lock_deployment(engine, &spec.deployment_name)?;

    let out = TerminalOutput::new(json, "checking status...");
    let result = match engine.status(&spec, &out) {
        Ok(r) => {
            out.finish_ok("status checked");
            r
        }
        Err(e) => {
            out.finish_fail("status check failed");
            return Err(e.to_string());
        }
    };
    let report = &result.report;

    if json {
        let payload = serde_json::json!({
            "deployment": spec.deployment_name,
            "recorded": result.record.is_some(),
            "drifted": result.drifted,
            "report": report,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("deployment: {}", spec.deployment_name);
        println!(
            "health:     {} ({})",
            colorize_health(report.health),
            report.health_message
        );
        if result.drifted {
            println!("manifest:   changed since deploy (redeploy to apply)");
        }
        println!();
        println!("{:<12} {:<20} {:<8} MESSAGE", "KIND", "NAME", "HEALTH");
        for resource in &report.resources {
            println!(
                "{:<12} {:<20} {:<8} {}",
                resource.kind,
                resource.name,
                colorize_health(resource.health),
                resource.health_message
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
