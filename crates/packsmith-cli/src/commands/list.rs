use super::{colorize_state, json_pretty, EXIT_SUCCESS};
use packsmith_core::Engine;

pub fn run(engine: &Engine, json: bool) -> Result<u8, String> {
    let records = engine.list().map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(&records)?);
    } else if records.is_empty() {
        println!("no deployments found");
    } else {
        println!(
            "{:<24} {:<20} {:<16} {:<10} UPDATED",
            "DEPLOYMENT", "PACK", "REGISTRY", "STATE"
        );
        for record in &records {
            println!(
                "{:<24} {:<20} {:<16} {:<10} {}",
                record.deployment_name.as_str(),
                record.pack.as_str(),
                record.registry.as_str(),
                colorize_state(&record.state.to_string()),
                record.updated_at
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
