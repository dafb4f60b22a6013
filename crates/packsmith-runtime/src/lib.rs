//! External tool invocation and output interpretation for packsmith.
//!
//! This crate implements the execution layer: the pluggable `ToolInvoker`
//! trait with a process-spawning `CommandInvoker` and an in-memory
//! `MockInvoker`, the registry registration step, argv builders for the
//! tool's `run`/`status`/`destroy` verbs, the status table parser, health
//! classification, and prerequisite checking.

pub mod args;
pub mod health;
pub mod invoker;
pub mod mock;
pub mod prereq;
pub mod registry;
pub mod table;

pub use args::{destroy_args, run_args, status_args};
pub use health::{classify, HealthLevel};
pub use invoker::{select_invoker, CommandInvoker, ToolInvoker};
pub use mock::MockInvoker;
pub use prereq::{check_tool_prereqs, format_missing, MissingPrereq};
pub use registry::{add_registry, registry_add_args, RegistryQualifier};
pub use table::{
    parse_status, PackStatusRecord, StatusLookup, StatusParser, TableFormat, TableParser,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invoker backend '{0}' is not available")]
    BackendUnavailable(String),
    #[error("tool '{0}' was not found")]
    ToolUnavailable(String),
    #[error("'{verb}' invocation failed: {detail}")]
    InvocationFailed {
        verb: String,
        detail: String,
        /// Whatever the tool printed before failing (stdout, then stderr).
        output: Vec<u8>,
    },
    #[error("unexpected status output: {0}")]
    UnexpectedOutput(String),
}

impl RuntimeError {
    /// Output captured from a failed invocation, if any.
    pub fn partial_output(&self) -> Option<&[u8]> {
        match self {
            RuntimeError::InvocationFailed { output, .. } if !output.is_empty() => Some(output),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_failure_display_names_verb() {
        let e = RuntimeError::InvocationFailed {
            verb: "run".to_owned(),
            detail: "exited with code 1".to_owned(),
            output: b"boom".to_vec(),
        };
        let msg = e.to_string();
        assert!(msg.contains("'run'"));
        assert!(msg.contains("code 1"));
        assert_eq!(e.partial_output(), Some(&b"boom"[..]));
    }

    #[test]
    fn empty_output_is_not_partial_output() {
        let e = RuntimeError::InvocationFailed {
            verb: "run".to_owned(),
            detail: "x".to_owned(),
            output: Vec::new(),
        };
        assert!(e.partial_output().is_none());
        assert!(RuntimeError::UnexpectedOutput("x".to_owned())
            .partial_output()
            .is_none());
    }
}
