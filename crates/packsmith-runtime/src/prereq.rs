use std::fmt;
use std::path::Path;
use std::process::Command;

/// A missing prerequisite with actionable install instructions.
#[derive(Debug)]
pub struct MissingPrereq {
    pub name: String,
    pub purpose: &'static str,
    pub install_hint: &'static str,
}

impl fmt::Display for MissingPrereq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  - {}: {} (install: {})",
            self.name, self.purpose, self.install_hint
        )
    }
}

fn command_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

pub(crate) fn binary_exists(binary: &str) -> bool {
    if binary.contains('/') {
        Path::new(binary).is_file()
    } else {
        command_exists(binary)
    }
}

/// Check prerequisites for the command backend.
///
/// The pack tool itself must be on `PATH` (or at the configured path), and it
/// clones registries with git. Empty list means all prerequisites are met.
pub fn check_tool_prereqs(binary: &str) -> Vec<MissingPrereq> {
    let mut missing = Vec::new();

    if !binary_exists(binary) {
        missing.push(MissingPrereq {
            name: binary.to_owned(),
            purpose: "rendering and deploying packs",
            install_hint: "download nomad-pack from https://releases.hashicorp.com/nomad-pack/ or set [tool] binary",
        });
    }

    if !command_exists("git") {
        missing.push(MissingPrereq {
            name: "git".to_owned(),
            purpose: "fetching pack registries",
            install_hint: "zypper install git | apt install git | dnf install git | pacman -S git",
        });
    }

    missing
}

/// Format a list of missing prerequisites into a user-friendly error message.
pub fn format_missing(missing: &[MissingPrereq]) -> String {
    use std::fmt::Write as _;
    let mut msg = String::from("missing prerequisites:\n");
    for m in missing {
        let _ = writeln!(msg, "{m}");
    }
    msg.push_str("\npacksmith drives these tools to register registries and deploy packs.");
    msg
}
