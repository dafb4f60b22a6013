//! User-facing output sinks.
//!
//! Separate from `tracing`: what goes through a [`UserOutput`] is meant for
//! the person running the operation (tool output, errors, progress steps),
//! whereas log events are diagnostics.

use serde::Serialize;
use std::sync::{Mutex, PoisonError};

pub trait UserOutput {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
    /// A progress step of a longer operation.
    fn step(&self, message: &str);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullOutput;

impl UserOutput for NullOutput {
    fn info(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
    fn step(&self, _message: &str) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Info,
    Error,
    Step,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputLine {
    pub kind: OutputKind,
    pub text: String,
}

/// Captures output in order, for tests and for `--json` hosts that attach
/// the transcript to their result.
#[derive(Debug, Default)]
pub struct RecordingOutput {
    lines: Mutex<Vec<OutputLine>>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, kind: OutputKind, text: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(OutputLine {
                kind,
                text: text.to_owned(),
            });
    }

    pub fn lines(&self) -> Vec<OutputLine> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn texts(&self, kind: OutputKind) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.kind == kind)
            .map(|l| l.text)
            .collect()
    }

    pub fn infos(&self) -> Vec<String> {
        self.texts(OutputKind::Info)
    }

    pub fn errors(&self) -> Vec<String> {
        self.texts(OutputKind::Error)
    }

    pub fn steps(&self) -> Vec<String> {
        self.texts(OutputKind::Step)
    }
}

impl UserOutput for RecordingOutput {
    fn info(&self, message: &str) {
        self.push(OutputKind::Info, message);
    }

    fn error(&self, message: &str) {
        self.push(OutputKind::Error, message);
    }

    fn step(&self, message: &str) {
        self.push(OutputKind::Step, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_keeps_order_and_kind() {
        let out = RecordingOutput::new();
        out.step("one");
        out.info("two");
        out.error("three");
        let lines = out.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].kind, OutputKind::Step);
        assert_eq!(out.infos(), vec!["two"]);
        assert_eq!(out.errors(), vec!["three"]);
        assert_eq!(out.steps(), vec!["one"]);
    }

    #[test]
    fn output_line_serializes_lowercase_kind() {
        let line = OutputLine {
            kind: OutputKind::Error,
            text: "x".to_owned(),
        };
        assert_eq!(
            serde_json::to_string(&line).unwrap(),
            r#"{"kind":"error","text":"x"}"#
        );
    }

    #[test]
    fn null_output_accepts_everything() {
        let out: &dyn UserOutput = &NullOutput;
        out.info("a");
        out.error("b");
        out.step("c");
    }
}
