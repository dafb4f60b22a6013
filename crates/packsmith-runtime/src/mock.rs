//! In-memory stand-in for the pack tool.
//!
//! Keeps registered registries and deployed packs in memory, renders `status`
//! in the tool's table format, and records every argv so tests can assert
//! the exact invocation sequence.

use crate::invoker::{verb_of, ToolInvoker};
use crate::RuntimeError;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

const STATUS_HEADER: &str = "PACK NAME | REGISTRY NAME | DEPLOYMENT NAME | JOB NAME | STATUS";
const STATUS_SEPARATOR: &str = "----------+---------------+-----------------+----------+-------";

#[derive(Debug, Clone)]
struct MockPack {
    pack: String,
    registry: String,
    job: String,
    status: String,
}

#[derive(Debug)]
struct MockState {
    calls: Vec<Vec<String>>,
    registries: BTreeMap<String, String>,
    deployments: BTreeMap<String, MockPack>,
    failures: HashMap<String, String>,
    raw_status: Option<String>,
    status_text: String,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            registries: BTreeMap::new(),
            deployments: BTreeMap::new(),
            failures: HashMap::new(),
            raw_status: None,
            status_text: "running".to_owned(),
        }
    }
}

#[derive(Default)]
pub struct MockInvoker {
    state: Mutex<MockState>,
}

fn flag<'a>(args: &'a [String], prefix: &str) -> Option<&'a str> {
    args.iter().find_map(|a| a.strip_prefix(prefix))
}

fn failed(verb: &str, message: &str) -> RuntimeError {
    RuntimeError::InvocationFailed {
        verb: verb.to_owned(),
        detail: "exited with code 1".to_owned(),
        output: format!("{message}\n").into_bytes(),
    }
}

impl MockInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MockState>, RuntimeError> {
        self.state
            .lock()
            .map_err(|e| RuntimeError::UnexpectedOutput(format!("mock mutex poisoned: {e}")))
    }

    /// Every argv received so far, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    /// The verb of every call so far (`registry` calls include the subverb).
    pub fn verbs(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| match c.as_slice() {
                [first, second, ..] if first == "registry" => format!("{first} {second}"),
                _ => verb_of(c),
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut s) = self.lock() {
            s.calls.clear();
        }
    }

    /// Make every subsequent call with `verb` fail with `message` as output.
    pub fn fail_verb(&self, verb: &str, message: &str) {
        if let Ok(mut s) = self.lock() {
            s.failures.insert(verb.to_owned(), message.to_owned());
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut s) = self.lock() {
            s.failures.clear();
        }
    }

    /// Set the status text reported for current and future deployments.
    pub fn set_status(&self, text: &str) {
        if let Ok(mut s) = self.lock() {
            text.clone_into(&mut s.status_text);
            for pack in s.deployments.values_mut() {
                text.clone_into(&mut pack.status);
            }
        }
    }

    /// Return `raw` verbatim from every `status` call, bypassing the table.
    pub fn set_raw_status(&self, raw: &str) {
        if let Ok(mut s) = self.lock() {
            s.raw_status = Some(raw.to_owned());
        }
    }

    pub fn is_deployed(&self, deployment_name: &str) -> bool {
        self.lock()
            .map(|s| s.deployments.contains_key(deployment_name))
            .unwrap_or(false)
    }

    fn registry_add(state: &mut MockState, args: &[String]) -> Result<Vec<u8>, RuntimeError> {
        match args {
            [_, sub, name, source, ..] if sub == "add" => {
                state.registries.insert(name.clone(), source.clone());
                Ok(format!("Registry {name} added from {source}\n").into_bytes())
            }
            _ => Err(failed("registry", "usage: registry add <name> <source>")),
        }
    }

    fn run(state: &mut MockState, args: &[String]) -> Result<Vec<u8>, RuntimeError> {
        let (Some(pack), Some(name), Some(registry)) = (
            args.get(1),
            flag(args, "--name="),
            flag(args, "--registry="),
        ) else {
            return Err(failed("run", "usage: run <pack> --name=<n> --registry=<r>"));
        };
        if !state.registries.contains_key(registry) {
            return Err(failed("run", &format!("registry {registry} not found")));
        }
        let status = state.status_text.clone();
        state.deployments.insert(
            name.to_owned(),
            MockPack {
                pack: pack.clone(),
                registry: registry.to_owned(),
                job: name.to_owned(),
                status,
            },
        );
        Ok(format!("Pack {pack} successfully deployed as {name}\n").into_bytes())
    }

    fn status(state: &MockState, args: &[String]) -> Vec<u8> {
        if let Some(ref raw) = state.raw_status {
            return raw.clone().into_bytes();
        }
        let pack = args.get(1).map(String::as_str);
        let name = flag(args, "--name=");
        let registry = flag(args, "--registry=");

        let mut out = format!("{STATUS_HEADER}\n{STATUS_SEPARATOR}\n");
        for (deployment, p) in &state.deployments {
            if Some(p.pack.as_str()) == pack
                && Some(deployment.as_str()) == name
                && Some(p.registry.as_str()) == registry
            {
                out.push_str(&format!(
                    "{}|{}|{}|{}|{}\n",
                    p.pack, p.registry, deployment, p.job, p.status
                ));
            }
        }
        out.into_bytes()
    }

    fn destroy(state: &mut MockState, args: &[String]) -> Result<Vec<u8>, RuntimeError> {
        let Some(name) = flag(args, "--name=") else {
            return Err(failed("destroy", "usage: destroy <pack> --name=<n>"));
        };
        match state.deployments.remove(name) {
            Some(p) => Ok(format!("Pack {} destroyed\n", p.pack).into_bytes()),
            None => Err(failed("destroy", &format!("no deployment named {name}"))),
        }
    }
}

impl ToolInvoker for MockInvoker {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn available(&self) -> bool {
        true
    }

    fn invoke(&self, args: &[String]) -> Result<Vec<u8>, RuntimeError> {
        let mut state = self.lock()?;
        state.calls.push(args.to_vec());

        let verb = verb_of(args);
        if let Some(message) = state.failures.get(&verb) {
            return Err(failed(&verb, message));
        }

        match verb.as_str() {
            "registry" => Self::registry_add(&mut state, args),
            "run" => Self::run(&mut state, args),
            "status" => Ok(Self::status(&state, args)),
            "destroy" => Self::destroy(&mut state, args),
            other => Err(failed(other, &format!("unknown command {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{parse_status, StatusLookup};

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    fn status(mock: &MockInvoker) -> StatusLookup {
        let out = mock
            .invoke(&args(&["status", "redis", "--registry=r1", "--name=d1"]))
            .unwrap();
        parse_status(&String::from_utf8(out).unwrap()).unwrap()
    }

    #[test]
    fn mock_lifecycle() {
        let mock = MockInvoker::new();
        mock.invoke(&args(&["registry", "add", "r1", "github.com/x/y"]))
            .unwrap();
        assert_eq!(status(&mock), StatusLookup::NotFound);

        mock.invoke(&args(&["run", "redis", "--name=d1", "--registry=r1"]))
            .unwrap();
        assert!(mock.is_deployed("d1"));
        match status(&mock) {
            StatusLookup::Found(record) => {
                assert_eq!(record.pack_name, "redis");
                assert_eq!(record.status, "running");
            }
            StatusLookup::NotFound => panic!("expected a status row"),
        }

        mock.invoke(&args(&["destroy", "redis", "--name=d1", "--registry=r1"]))
            .unwrap();
        assert!(!mock.is_deployed("d1"));
        assert!(mock
            .invoke(&args(&["destroy", "redis", "--name=d1", "--registry=r1"]))
            .is_err());
    }

    #[test]
    fn run_requires_registered_registry() {
        let mock = MockInvoker::new();
        let err = mock
            .invoke(&args(&["run", "redis", "--name=d1", "--registry=r1"]))
            .unwrap_err();
        assert!(err.partial_output().is_some());
    }

    #[test]
    fn injected_failure_applies_to_verb() {
        let mock = MockInvoker::new();
        mock.fail_verb("registry", "cannot clone");
        let err = mock
            .invoke(&args(&["registry", "add", "r1", "src"]))
            .unwrap_err();
        assert_eq!(err.partial_output(), Some(&b"cannot clone\n"[..]));
        mock.clear_failures();
        assert!(mock.invoke(&args(&["registry", "add", "r1", "src"])).is_ok());
    }

    #[test]
    fn set_status_updates_existing_deployments() {
        let mock = MockInvoker::new();
        mock.invoke(&args(&["registry", "add", "r1", "src"])).unwrap();
        mock.invoke(&args(&["run", "redis", "--name=d1", "--registry=r1"]))
            .unwrap();
        mock.set_status("pending");
        let StatusLookup::Found(record) = status(&mock) else {
            panic!("expected a status row");
        };
        assert_eq!(record.status, "pending");
    }

    #[test]
    fn verbs_include_registry_subverb() {
        let mock = MockInvoker::new();
        mock.invoke(&args(&["registry", "add", "r1", "src"])).unwrap();
        mock.invoke(&args(&["status", "redis", "--registry=r1", "--name=d1"]))
            .unwrap();
        assert_eq!(mock.verbs(), vec!["registry add", "status"]);
        mock.clear_calls();
        assert!(mock.calls().is_empty());
    }
}
