//! Command Runner
//!
//! Runs a tool directly on the host with the caller's stdin/stdout/stderr
//! attached. PATH lookup skips devtool shims so that a fallback never
//! re-enters the dispatcher.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use thiserror::Error;

use crate::core::Invocation;
use crate::shim;

use super::HostExecutor;

/// Exit status used when the tool cannot be found, as shells do
pub const NOT_FOUND_EXIT: i32 = 127;

/// Command runner errors
#[derive(Debug, Error)]
pub enum ExecError {
    /// No executable with this name on PATH
    #[error("{0}: command not found")]
    NotFound(String),

    /// The process could not be spawned or waited on
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Map a finished child to a shell-style exit code.
///
/// Signal deaths on unix become `128 + signal`.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

/// Spawns tools on the host
pub struct CommandRunner {
    /// Environment variables to add
    env_additions: HashMap<String, String>,
}

impl CommandRunner {
    pub fn new() -> Self {
        Self {
            env_additions: HashMap::new(),
        }
    }

    /// Add an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_additions.insert(key.into(), value.into());
        self
    }

    /// Find a binary in PATH, skipping devtool shims and this executable
    pub fn which(binary: &str) -> Option<PathBuf> {
        // Explicit paths are taken as-is
        if binary.contains(std::path::MAIN_SEPARATOR) || binary.contains('/') {
            let path = PathBuf::from(binary);
            return path.exists().then_some(path);
        }

        let current_exe = std::env::current_exe()
            .ok()
            .and_then(|p| p.canonicalize().ok());

        which::which_all(binary)
            .ok()?
            .find(|candidate| !Self::is_self_reference(candidate, current_exe.as_deref()))
    }

    fn is_self_reference(candidate: &Path, current_exe: Option<&Path>) -> bool {
        if shim::is_devtool_shim(candidate) {
            tracing::debug!(path = %candidate.display(), "skipping devtool shim on PATH");
            return true;
        }
        match (candidate.canonicalize().ok(), current_exe) {
            (Some(resolved), Some(exe)) => resolved == exe,
            _ => false,
        }
    }
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl HostExecutor for CommandRunner {
    fn exec_on_host(&self, invocation: &Invocation) -> Result<i32, ExecError> {
        let binary_path = Self::which(&invocation.tool)
            .ok_or_else(|| ExecError::NotFound(invocation.tool.clone()))?;

        tracing::debug!(
            path = %binary_path.display(),
            command = %invocation.display(),
            "running on host"
        );

        let mut cmd = Command::new(&binary_path);
        cmd.args(&invocation.args)
            .envs(&self.env_additions)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let status = cmd.status().map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => ExecError::NotFound(invocation.tool.clone()),
            _ => ExecError::Launch {
                program: binary_path.display().to_string(),
                source,
            },
        })?;

        Ok(exit_code(status))
    }
}
