use super::{colorize_state, json_pretty, EXIT_SUCCESS};
use packsmith_core::Engine;
use packsmith_store::load_state;

pub fn run(engine: &Engine, name: &str, json: bool) -> Result<u8, String> {
    let record = engine.inspect(name).map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(&record)?);
        return Ok(EXIT_SUCCESS);
    }

    let recorded_pack = match load_state(record.resource_state_bytes(), name) {
        Ok(state) if record.resource_state.is_some() => state.pack_name,
        Ok(state) => format!("{} (reconstructed)", state.pack_name),
        Err(e) => format!("unreadable ({e})"),
    };

    println!("deployment:  {}", record.deployment_name);
    println!("pack:        {}", record.pack);
    println!("registry:    {}", record.registry);
    println!("state:       {}", colorize_state(&record.state.to_string()));
    println!("state pack:  {recorded_pack}");
    println!(
        "generation:  {}",
        record.generation.as_deref().unwrap_or("(unknown)")
    );
    println!("created_at:  {}", record.created_at);
    println!("updated_at:  {}", record.updated_at);
    Ok(EXIT_SUCCESS)
}
