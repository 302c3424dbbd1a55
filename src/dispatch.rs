//! Command Dispatcher
//!
//! Resolves a [`DispatchRequest`] to a running container and runs the tool
//! there, or runs it on the host when no container matches or the runtime
//! cannot be queried. Single-shot and blocking: one listing query, one
//! child process, no retries.

use std::io::Write;

use thiserror::Error;

use crate::core::{ContainerSelector, DispatchRequest, Invocation, RoleSuffixes, SelectError};
use crate::host::{ExecError, HostExecutor};
use crate::runtime::ContainerRuntime;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Ambiguous(#[from] SelectError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("failed to write fallback warning: {0}")]
    Notice(#[from] std::io::Error),
}

/// Why a request ran on the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The runtime answered but nothing matched `pattern`
    NoMatchingContainer { pattern: String },
    /// The listing query itself failed
    RuntimeUnavailable(String),
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::NoMatchingContainer { pattern } => {
                write!(f, "no running container matches '{}'", pattern)
            }
            FallbackReason::RuntimeUnavailable(reason) => f.write_str(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Container(String),
    Host(FallbackReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub target: Target,
    /// Exit status of the child, forwarded unchanged
    pub exit_code: i32,
}

pub struct Dispatcher<R, H> {
    runtime: R,
    host: H,
    selector: ContainerSelector,
    suffixes: RoleSuffixes,
    container_workdir: Option<String>,
}

impl<R: ContainerRuntime, H: HostExecutor> Dispatcher<R, H> {
    pub fn new(runtime: R, host: H) -> Self {
        Self {
            runtime,
            host,
            selector: ContainerSelector::default(),
            suffixes: RoleSuffixes::default(),
            container_workdir: None,
        }
    }

    pub fn with_selector(mut self, selector: ContainerSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_suffixes(mut self, suffixes: RoleSuffixes) -> Self {
        self.suffixes = suffixes;
        self
    }

    /// Working directory for container execs; the host path always runs in
    /// the caller's directory
    pub fn with_container_workdir(mut self, workdir: Option<String>) -> Self {
        self.container_workdir = workdir;
        self
    }

    /// Run `request` and return where it ran and its exit status.
    ///
    /// On host fallback exactly one warning line is written to `notices`.
    pub fn dispatch<W: Write>(
        &self,
        request: &DispatchRequest,
        notices: &mut W,
    ) -> Result<DispatchOutcome, DispatchError> {
        let suffix = self.suffixes.suffix(request.role);
        let invocation = Invocation::from(request);

        let reason = match self.runtime.list_running_containers() {
            Ok(running) => {
                tracing::debug!(role = %request.role, suffix, running = ?running, "container snapshot");
                match self.selector.select(suffix, &running)? {
                    Some(container) => {
                        let invocation = invocation.with_workdir(self.container_workdir.clone());
                        tracing::debug!(container, command = %invocation.display(), "dispatching into container");
                        let exit_code = self.runtime.exec_in_container(container, &invocation)?;
                        return Ok(DispatchOutcome {
                            target: Target::Container(container.to_string()),
                            exit_code,
                        });
                    }
                    None => FallbackReason::NoMatchingContainer {
                        pattern: self.selector.pattern(suffix),
                    },
                }
            }
            Err(err) => FallbackReason::RuntimeUnavailable(err.to_string()),
        };

        tracing::debug!(%reason, tool = %request.tool, "falling back to host");
        writeln!(
            notices,
            "devtool: warning: {}; running `{}` on the host",
            reason, request.tool
        )?;

        let exit_code = self.host.exec_on_host(&invocation)?;
        Ok(DispatchOutcome {
            target: Target::Host(reason),
            exit_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AmbiguityPolicy, Role};
    use crate::runtime::RuntimeError;
    use std::cell::RefCell;

    /// Registry fake recording every exec
    struct FakeRuntime {
        running: Option<Vec<String>>,
        exit_code: i32,
        execs: RefCell<Vec<(String, Invocation)>>,
    }

    impl FakeRuntime {
        fn with(names: &[&str]) -> Self {
            Self {
                running: Some(names.iter().map(|s| s.to_string()).collect()),
                exit_code: 0,
                execs: RefCell::new(Vec::new()),
            }
        }

        fn unavailable() -> Self {
            Self {
                running: None,
                exit_code: 0,
                execs: RefCell::new(Vec::new()),
            }
        }

        fn exiting(mut self, code: i32) -> Self {
            self.exit_code = code;
            self
        }
    }

    impl ContainerRuntime for FakeRuntime {
        fn list_running_containers(&self) -> Result<Vec<String>, RuntimeError> {
            self.running.clone().ok_or_else(|| RuntimeError::Unavailable {
                binary: "docker".to_string(),
                reason: "Cannot connect to the Docker daemon".to_string(),
            })
        }

        fn exec_in_container(&self, container: &str, invocation: &Invocation) -> Result<i32, ExecError> {
            self.execs
                .borrow_mut()
                .push((container.to_string(), invocation.clone()));
            Ok(self.exit_code)
        }
    }

    struct FakeHost {
        result: Result<i32, String>,
        runs: RefCell<Vec<Invocation>>,
    }

    impl FakeHost {
        fn exiting(code: i32) -> Self {
            Self {
                result: Ok(code),
                runs: RefCell::new(Vec::new()),
            }
        }

        fn missing() -> Self {
            Self {
                result: Err("missing".to_string()),
                runs: RefCell::new(Vec::new()),
            }
        }
    }

    impl HostExecutor for FakeHost {
        fn exec_on_host(&self, invocation: &Invocation) -> Result<i32, ExecError> {
            self.runs.borrow_mut().push(invocation.clone());
            self.result
                .clone()
                .map_err(|_| ExecError::NotFound(invocation.tool.clone()))
        }
    }

    fn request(tool: &str, args: &[&str]) -> DispatchRequest {
        DispatchRequest::for_known_tool(tool, args.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    fn warning_lines(buf: &[u8]) -> Vec<String> {
        String::from_utf8_lossy(buf)
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_dispatches_into_matching_container() {
        let runtime = FakeRuntime::with(&["dev_container_php", "dev_container_node"]);
        let host = FakeHost::exiting(0);
        let dispatcher = Dispatcher::new(&runtime, &host);
        let mut notices = Vec::new();

        let outcome = dispatcher.dispatch(&request("php", &["-v"]), &mut notices).unwrap();

        assert_eq!(outcome.target, Target::Container("dev_container_php".to_string()));
        let execs = runtime.execs.borrow();
        assert_eq!(execs.len(), 1);
        assert_eq!(execs[0].0, "dev_container_php");
        assert_eq!(execs[0].1.tool, "php");
        assert!(host.runs.borrow().is_empty());
        assert!(notices.is_empty());
    }

    #[test]
    fn test_every_role_uses_its_own_container() {
        let runtime = FakeRuntime::with(&["dev_container_node", "dev_container_php"]);
        let host = FakeHost::exiting(0);
        let dispatcher = Dispatcher::new(&runtime, &host);

        for role in Role::ALL {
            for tool in role.tools() {
                let mut notices = Vec::new();
                let outcome = dispatcher.dispatch(&request(tool, &[]), &mut notices).unwrap();
                let expected = format!("dev_container{}", role.default_suffix());
                assert_eq!(outcome.target, Target::Container(expected));
            }
        }
        assert!(host.runs.borrow().is_empty());
    }

    #[test]
    fn test_falls_back_to_host_with_one_warning() {
        let runtime = FakeRuntime::with(&[]);
        let host = FakeHost::exiting(0);
        let dispatcher = Dispatcher::new(&runtime, &host);
        let mut notices = Vec::new();

        let outcome = dispatcher.dispatch(&request("node", &["-v"]), &mut notices).unwrap();

        assert_eq!(
            outcome.target,
            Target::Host(FallbackReason::NoMatchingContainer {
                pattern: "*_node".to_string()
            })
        );
        let runs = host.runs.borrow();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].tool, "node");
        assert_eq!(runs[0].args, vec!["-v"]);
        assert!(runtime.execs.borrow().is_empty());

        let lines = warning_lines(&notices);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("warning"));
        assert!(lines[0].contains("`node`"));
    }

    #[test]
    fn test_other_role_container_does_not_match() {
        let runtime = FakeRuntime::with(&["dev_container_php"]);
        let host = FakeHost::exiting(0);
        let dispatcher = Dispatcher::new(&runtime, &host);
        let mut notices = Vec::new();

        let outcome = dispatcher.dispatch(&request("npm", &["install"]), &mut notices).unwrap();

        assert!(matches!(outcome.target, Target::Host(_)));
        assert_eq!(warning_lines(&notices).len(), 1);
    }

    #[test]
    fn test_runtime_unavailable_falls_back() {
        let runtime = FakeRuntime::unavailable();
        let host = FakeHost::exiting(3);
        let dispatcher = Dispatcher::new(&runtime, &host);
        let mut notices = Vec::new();

        let outcome = dispatcher.dispatch(&request("composer", &["install"]), &mut notices).unwrap();

        assert_eq!(outcome.exit_code, 3);
        match outcome.target {
            Target::Host(FallbackReason::RuntimeUnavailable(reason)) => {
                assert!(reason.contains("Docker daemon"))
            }
            other => panic!("unexpected target {:?}", other),
        }
        let lines = warning_lines(&notices);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("unavailable"));
    }

    #[test]
    fn test_exit_code_propagates_both_paths() {
        let runtime = FakeRuntime::with(&["x_php"]).exiting(42);
        let host = FakeHost::exiting(0);
        let outcome = Dispatcher::new(&runtime, &host)
            .dispatch(&request("php", &[]), &mut Vec::new())
            .unwrap();
        assert_eq!(outcome.exit_code, 42);

        let runtime = FakeRuntime::with(&[]);
        let host = FakeHost::exiting(5);
        let outcome = Dispatcher::new(&runtime, &host)
            .dispatch(&request("php", &[]), &mut Vec::new())
            .unwrap();
        assert_eq!(outcome.exit_code, 5);
    }

    #[test]
    fn test_arguments_forwarded_unaltered() {
        let args = [
            "-r",
            "echo 'hello world';",
            "two words",
            "$(rm -rf /)",
            "a|b&&c>d",
            "",
            "--opt=\"x y\"",
        ];
        let expected: Vec<String> = args.iter().map(|s| s.to_string()).collect();

        let runtime = FakeRuntime::with(&["dev_php"]);
        let host = FakeHost::exiting(0);
        Dispatcher::new(&runtime, &host)
            .dispatch(&request("php", &args), &mut Vec::new())
            .unwrap();
        assert_eq!(runtime.execs.borrow()[0].1.args, expected);

        let runtime = FakeRuntime::with(&[]);
        Dispatcher::new(&runtime, &host)
            .dispatch(&request("php", &args), &mut Vec::new())
            .unwrap();
        assert_eq!(host.runs.borrow()[0].args, expected);
    }

    #[test]
    fn test_ambiguity_is_reported_without_running_anything() {
        let runtime = FakeRuntime::with(&["a_php", "b_php"]);
        let host = FakeHost::exiting(0);
        let mut notices = Vec::new();

        let err = Dispatcher::new(&runtime, &host)
            .dispatch(&request("php", &[]), &mut notices)
            .unwrap_err();

        assert!(matches!(err, DispatchError::Ambiguous(_)));
        assert!(runtime.execs.borrow().is_empty());
        assert!(host.runs.borrow().is_empty());
        assert!(notices.is_empty());
    }

    #[test]
    fn test_first_policy_and_configured_name() {
        let runtime = FakeRuntime::with(&["a_php", "b_php"]);
        let host = FakeHost::exiting(0);

        let outcome = Dispatcher::new(&runtime, &host)
            .with_selector(ContainerSelector::new(None, AmbiguityPolicy::First))
            .dispatch(&request("php", &[]), &mut Vec::new())
            .unwrap();
        assert_eq!(outcome.target, Target::Container("a_php".to_string()));

        let outcome = Dispatcher::new(&runtime, &host)
            .with_selector(ContainerSelector::new(Some("b".to_string()), AmbiguityPolicy::Error))
            .dispatch(&request("php", &[]), &mut Vec::new())
            .unwrap();
        assert_eq!(outcome.target, Target::Container("b_php".to_string()));
    }

    #[test]
    fn test_workdir_only_applies_in_container() {
        let runtime = FakeRuntime::with(&["dev_php"]);
        let host = FakeHost::exiting(0);
        let dispatcher = Dispatcher::new(&runtime, &host)
            .with_container_workdir(Some("/var/www/html/app".to_string()));

        dispatcher.dispatch(&request("php", &[]), &mut Vec::new()).unwrap();
        assert_eq!(
            runtime.execs.borrow()[0].1.workdir.as_deref(),
            Some("/var/www/html/app")
        );

        let runtime = FakeRuntime::with(&[]);
        Dispatcher::new(&runtime, &host)
            .with_container_workdir(Some("/var/www/html/app".to_string()))
            .dispatch(&request("php", &[]), &mut Vec::new())
            .unwrap();
        assert_eq!(host.runs.borrow()[0].workdir, None);
    }

    #[test]
    fn test_custom_suffixes() {
        let runtime = FakeRuntime::with(&["stack-fpm"]);
        let host = FakeHost::exiting(0);
        let suffixes = RoleSuffixes {
            php: "-fpm".to_string(),
            node: "-node".to_string(),
        };
        let outcome = Dispatcher::new(&runtime, &host)
            .with_suffixes(suffixes)
            .dispatch(&request("composer", &[]), &mut Vec::new())
            .unwrap();
        assert_eq!(outcome.target, Target::Container("stack-fpm".to_string()));
    }

    #[test]
    fn test_missing_host_tool() {
        let runtime = FakeRuntime::with(&[]);
        let host = FakeHost::missing();
        let mut notices = Vec::new();

        let err = Dispatcher::new(&runtime, &host)
            .dispatch(&request("npx", &["vite"]), &mut notices)
            .unwrap_err();

        assert!(matches!(err, DispatchError::Exec(ExecError::NotFound(ref tool)) if tool == "npx"));
        assert_eq!(warning_lines(&notices).len(), 1);
    }
}
