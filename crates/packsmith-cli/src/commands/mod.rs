pub mod completions;
pub mod deploy;
pub mod destroy;
pub mod doctor;
pub mod generation;
pub mod init;
pub mod inspect;
pub mod list;
pub mod man_pages;
pub mod status;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use packsmith_core::{load_manifest, DeploymentLock, Engine, UserOutput};
use packsmith_runtime::HealthLevel;
use packsmith_schema::DeploymentSpec;
use std::path::Path;
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_STORE_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn colorize_state(state: &str) -> String {
    match state {
        "present" => Style::new().green().apply_to(state).to_string(),
        "creating" | "destroying" => Style::new().yellow().apply_to(state).to_string(),
        "absent" => Style::new().dim().apply_to(state).to_string(),
        other => other.to_owned(),
    }
}

pub fn colorize_health(health: HealthLevel) -> String {
    let text = health.to_string();
    match health {
        HealthLevel::Ready => Style::new().green().bold().apply_to(text).to_string(),
        HealthLevel::Down => Style::new().red().bold().apply_to(text).to_string(),
        HealthLevel::Unknown => Style::new().yellow().apply_to(text).to_string(),
    }
}

pub fn load_spec(manifest: &Path) -> Result<DeploymentSpec, String> {
    load_manifest(manifest).map_err(|e| e.to_string())
}

/// Fail early when the tool the manifest selects is not installed.
/// `PACKSMITH_SKIP_PREREQS=1` disables the check.
pub fn ensure_tool(spec: &DeploymentSpec) -> Result<(), String> {
    if spec.tool.backend != "command"
        || std::env::var("PACKSMITH_SKIP_PREREQS").as_deref() == Ok("1")
    {
        tracing::debug!("skipping prerequisite check for {}", spec.tool.binary);
        return Ok(());
    }
    let missing = packsmith_runtime::check_tool_prereqs(&spec.tool.binary);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(packsmith_runtime::format_missing(&missing))
    }
}

pub fn lock_deployment(engine: &Engine, name: &str) -> Result<DeploymentLock, String> {
    let lock =
        DeploymentLock::acquire(engine.layout(), name).map_err(|e| format!("store lock: {e}"))?;
    tracing::debug!("acquired deployment lock for '{name}'");
    Ok(lock)
}

/// Terminal sink: tool output to stdout, errors in red to stderr, steps as
/// spinner messages. In JSON mode tool output is dropped so stdout stays
/// machine-readable.
pub struct TerminalOutput {
    progress: Option<ProgressBar>,
    json: bool,
}

impl TerminalOutput {
    pub fn new(json: bool, msg: &str) -> Self {
        Self {
            progress: if json { None } else { Some(spinner(msg)) },
            json,
        }
    }

    pub fn finish_ok(&self, msg: &str) {
        if let Some(ref pb) = self.progress {
            spin_ok(pb, msg);
        }
    }

    pub fn finish_fail(&self, msg: &str) {
        if let Some(ref pb) = self.progress {
            spin_fail(pb, msg);
        }
    }

    fn print(&self, f: impl FnOnce()) {
        match self.progress {
            Some(ref pb) => pb.suspend(f),
            None => f(),
        }
    }
}

impl UserOutput for TerminalOutput {
    fn info(&self, message: &str) {
        let text = message.trim_end();
        if self.json || text.is_empty() {
            return;
        }
        self.print(|| println!("{text}"));
    }

    fn error(&self, message: &str) {
        let text = message.trim_end();
        if text.is_empty() {
            return;
        }
        let styled = Style::new().red().apply_to(text);
        self.print(|| eprintln!("{styled}"));
    }

    fn step(&self, message: &str) {
        if let Some(ref pb) = self.progress {
            pb.set_message(message.to_owned());
        }
    }
}
