use crate::RuntimeError;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Arc;
use tracing::{debug, trace};

/// Runs the external pack tool.
///
/// `args[0]` is the verb (`registry`, `run`, `status`, `destroy`). One call
/// spawns at most one process and blocks until it exits; nothing is retried.
pub trait ToolInvoker: Send + Sync {
    fn name(&self) -> &str;

    fn available(&self) -> bool;

    /// Execute the tool and return its standard output on success.
    ///
    /// A non-zero exit yields [`RuntimeError::InvocationFailed`] carrying the
    /// output captured so far, so callers can show it before propagating.
    fn invoke(&self, args: &[String]) -> Result<Vec<u8>, RuntimeError>;
}

impl<T: ToolInvoker + ?Sized> ToolInvoker for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn available(&self) -> bool {
        (**self).available()
    }

    fn invoke(&self, args: &[String]) -> Result<Vec<u8>, RuntimeError> {
        (**self).invoke(args)
    }
}

pub(crate) fn verb_of(args: &[String]) -> String {
    args.first().cloned().unwrap_or_default()
}

/// Spawns the real tool binary with structured arguments (never a shell).
pub struct CommandInvoker {
    binary: String,
}

impl Default for CommandInvoker {
    fn default() -> Self {
        Self {
            binary: "nomad-pack".to_owned(),
        }
    }
}

impl CommandInvoker {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

fn exit_detail(status: ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("exited with code {code}");
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return format!("killed by signal {sig}");
        }
    }
    "failed with unknown status".to_owned()
}

impl ToolInvoker for CommandInvoker {
    fn name(&self) -> &'static str {
        "command"
    }

    fn available(&self) -> bool {
        crate::prereq::binary_exists(&self.binary)
    }

    fn invoke(&self, args: &[String]) -> Result<Vec<u8>, RuntimeError> {
        let verb = verb_of(args);
        debug!("invoking {} {}", self.binary, args.join(" "));

        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RuntimeError::ToolUnavailable(self.binary.clone())
                } else {
                    RuntimeError::InvocationFailed {
                        verb: verb.clone(),
                        detail: format!("failed to launch {}: {e}", self.binary),
                        output: Vec::new(),
                    }
                }
            })?;

        trace!(
            "{} {verb} stdout:\n{}",
            self.binary,
            String::from_utf8_lossy(&output.stdout)
        );

        if output.status.success() {
            Ok(output.stdout)
        } else {
            let mut captured = output.stdout;
            captured.extend_from_slice(&output.stderr);
            Err(RuntimeError::InvocationFailed {
                verb,
                detail: exit_detail(output.status),
                output: captured,
            })
        }
    }
}

pub fn select_invoker(backend: &str, binary: &str) -> Result<Box<dyn ToolInvoker>, RuntimeError> {
    match backend {
        "command" => Ok(Box::new(CommandInvoker::new(binary))),
        "mock" => Ok(Box::new(crate::mock::MockInvoker::new())),
        other => Err(RuntimeError::BackendUnavailable(other.to_owned())),
    }
}
