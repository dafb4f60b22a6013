use super::{EXIT_FAILURE, EXIT_SUCCESS};
use packsmith_core::DeploymentLock;
use packsmith_schema::default_binary;
use packsmith_store::{DeploymentState, RecordStore, StoreLayout};
use std::path::Path;

pub fn run(store_path: &Path, binary: Option<&str>, json_output: bool) -> Result<u8, String> {
    let mut checks: Vec<Check> = Vec::new();
    let mut all_pass = true;

    let binary = binary.map_or_else(default_binary, str::to_owned);
    check_prereqs(&binary, &mut checks, &mut all_pass);

    let layout = StoreLayout::new(store_path);
    if layout.is_initialized() {
        checks.push(Check::pass("store_exists", "Store directory exists"));
        check_store(&layout, &mut checks, &mut all_pass);
    } else {
        checks.push(Check::info(
            "store_exists",
            "Store not initialized (will be created on first deploy)",
        ));
    }

    print_results(&checks, all_pass, json_output)
}

fn check_prereqs(binary: &str, checks: &mut Vec<Check>, all_pass: &mut bool) {
    let missing = packsmith_runtime::check_tool_prereqs(binary);
    if missing.is_empty() {
        checks.push(Check::pass(
            "tool_prereqs",
            &format!("Tool prerequisites satisfied ({binary}, git)"),
        ));
    } else {
        *all_pass = false;
        checks.push(Check::fail(
            "tool_prereqs",
            &format!(
                "Missing prerequisites: {}",
                packsmith_runtime::format_missing(&missing)
            ),
        ));
    }
}

fn check_store(layout: &StoreLayout, checks: &mut Vec<Check>, all_pass: &mut bool) {
    match layout.verify_version() {
        Ok(()) => checks.push(Check::pass("store_version", "Store format version valid")),
        Err(e) => {
            *all_pass = false;
            checks.push(Check::fail(
                "store_version",
                &format!("Store version check failed: {e}"),
            ));
        }
    }

    let entries = match RecordStore::new(layout.clone()).list_with_errors() {
        Ok(entries) => entries,
        Err(e) => {
            *all_pass = false;
            checks.push(Check::fail(
                "records",
                &format!("Cannot list deployment records: {e}"),
            ));
            return;
        }
    };

    let mut records = Vec::new();
    let mut corrupted = 0usize;
    for entry in entries {
        match entry {
            Ok(record) => records.push(record),
            Err((name, e)) => {
                corrupted += 1;
                checks.push(Check::fail(
                    "record_integrity",
                    &format!("Record '{name}' is unreadable: {e}"),
                ));
            }
        }
    }
    if corrupted == 0 {
        checks.push(Check::pass(
            "record_integrity",
            &format!("Record integrity OK ({} records checked)", records.len()),
        ));
    } else {
        *all_pass = false;
    }

    for record in &records {
        if !matches!(
            record.state,
            DeploymentState::Creating | DeploymentState::Destroying
        ) {
            continue;
        }
        let name = record.deployment_name.as_str();
        match DeploymentLock::try_acquire(layout, name) {
            Ok(Some(_)) => checks.push(Check::warn(
                "interrupted",
                &format!(
                    "'{name}' was interrupted while {} (rolled back on next command)",
                    record.state
                ),
            )),
            Ok(None) => checks.push(Check::info(
                "in_progress",
                &format!("'{name}' is {} in another process", record.state),
            )),
            Err(e) => checks.push(Check::warn(
                "interrupted",
                &format!("Cannot check lock for '{name}': {e}"),
            )),
        }
    }

    let present = records
        .iter()
        .filter(|r| r.state == DeploymentState::Present)
        .count();
    checks.push(Check::info(
        "deployments",
        &format!("{} deployments ({present} present)", records.len()),
    ));
}

fn print_results(checks: &[Check], all_pass: bool, json_output: bool) -> Result<u8, String> {
    if json_output {
        let json = serde_json::json!({
            "healthy": all_pass,
            "checks": checks.iter().map(|c| serde_json::json!({
                "name": c.name,
                "status": c.status,
                "message": c.message,
            })).collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).map_err(|e| e.to_string())?
        );
    } else {
        println!("packsmith doctor\n");
        for check in checks {
            let icon = match check.status {
                "pass" => "✓",
                "fail" => "✗",
                "warn" => "⚠",
                _ => "ℹ",
            };
            println!("  {icon} {}", check.message);
        }
        println!();
        if all_pass {
            println!("All checks passed.");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }
    Ok(if all_pass { EXIT_SUCCESS } else { EXIT_FAILURE })
}

struct Check {
    name: &'static str,
    status: &'static str,
    message: String,
}

impl Check {
    fn new(name: &'static str, status: &'static str, message: &str) -> Self {
        Self {
            name,
            status,
            message: message.to_owned(),
        }
    }

    fn pass(name: &'static str, message: &str) -> Self {
        Self::new(name, "pass", message)
    }

    fn fail(name: &'static str, message: &str) -> Self {
        Self::new(name, "fail", message)
    }

    fn warn(name: &'static str, message: &str) -> Self {
        Self::new(name, "warn", message)
    }

    fn info(name: &'static str, message: &str) -> Self {
        Self::new(name, "info", message)
    }
}
