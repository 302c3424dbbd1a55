//! Docker (or podman) CLI backend

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::core::Invocation;
use crate::host::{exit_code, ExecError};

use super::{ComposeRuntime, ContainerRuntime, RuntimeError};

/// Whether `exec` allocates a pseudo-terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtyMode {
    /// Only when both stdin and stdout are terminals
    #[default]
    Auto,
    Always,
    Never,
}

impl TtyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TtyMode::Auto => "auto",
            TtyMode::Always => "always",
            TtyMode::Never => "never",
        }
    }

    fn resolve(self) -> bool {
        match self {
            TtyMode::Auto => std::io::stdin().is_terminal() && std::io::stdout().is_terminal(),
            TtyMode::Always => true,
            TtyMode::Never => false,
        }
    }
}

/// Talks to the container runtime through its CLI
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
    tty: TtyMode,
    /// Directory compose commands run in
    project_dir: Option<PathBuf>,
}

impl DockerCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            tty: TtyMode::Auto,
            project_dir: None,
        }
    }

    pub fn with_tty(mut self, tty: TtyMode) -> Self {
        self.tty = tty;
        self
    }

    pub fn with_project_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.project_dir = dir;
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Arguments for `<binary> exec ...`
    pub fn exec_args(container: &str, invocation: &Invocation, tty: bool) -> Vec<String> {
        let mut args = vec!["exec".to_string(), "-i".to_string()];
        if tty {
            args.push("-t".to_string());
        }
        if let Some(workdir) = &invocation.workdir {
            args.push("-w".to_string());
            args.push(workdir.clone());
        }
        args.push(container.to_string());
        args.push(invocation.tool.clone());
        args.extend(invocation.args.iter().cloned());
        args
    }

    fn unavailable(&self, reason: impl Into<String>) -> RuntimeError {
        RuntimeError::Unavailable {
            binary: self.binary.clone(),
            reason: reason.into(),
        }
    }

    fn run_compose(&self, args: &[&str]) -> Result<(), RuntimeError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("compose").args(args);
        if let Some(dir) = &self.project_dir {
            cmd.current_dir(dir);
        }

        let command = format!("{} compose {}", self.binary, args.join(" "));
        tracing::debug!(%command, "running compose command");

        let status = cmd.status().map_err(|e| self.unavailable(e.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(RuntimeError::CommandFailed {
                command,
                code: exit_code(status),
            })
        }
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

/// Parse `ps --format {{.Names}}` output, one name per line
pub fn parse_container_names(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

impl ContainerRuntime for DockerCli {
    fn list_running_containers(&self) -> Result<Vec<String>, RuntimeError> {
        let output = Command::new(&self.binary)
            .args(["ps", "--format", "{{.Names}}"])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.unavailable(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr.lines().next().unwrap_or("").trim();
            let reason = if reason.is_empty() {
                format!("`{} ps` exited with status {}", self.binary, exit_code(output.status))
            } else {
                reason.to_string()
            };
            return Err(self.unavailable(reason));
        }

        Ok(parse_container_names(&String::from_utf8_lossy(&output.stdout)))
    }

    fn exec_in_container(&self, container: &str, invocation: &Invocation) -> Result<i32, ExecError> {
        let args = Self::exec_args(container, invocation, self.tty.resolve());
        tracing::debug!(binary = %self.binary, ?args, "exec in container");

        let status = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| ExecError::Launch {
                program: self.binary.clone(),
                source,
            })?;

        Ok(exit_code(status))
    }
}

impl ComposeRuntime for DockerCli {
    fn compose_up(&self) -> Result<(), RuntimeError> {
        self.run_compose(&["up", "-d"])
    }

    fn compose_restart(&self, service: &str) -> Result<(), RuntimeError> {
        self.run_compose(&["restart", service])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_container_names() {
        let out = "dev_container_php\n\n  dev_container_node  \ndev_container_mariadb\n";
        assert_eq!(
            parse_container_names(out),
            vec!["dev_container_php", "dev_container_node", "dev_container_mariadb"]
        );
        assert!(parse_container_names("").is_empty());
    }

    #[test]
    fn test_exec_args_without_tty() {
        let invocation = Invocation::new("php", vec!["-v".to_string()]);
        assert_eq!(
            DockerCli::exec_args("dev_container_php", &invocation, false),
            vec!["exec", "-i", "dev_container_php", "php", "-v"]
        );
    }

    #[test]
    fn test_exec_args_with_tty_and_workdir() {
        let invocation = Invocation::new(
            "composer",
            vec!["require".to_string(), "a b".to_string(), "x;y".to_string()],
        )
        .with_workdir(Some("/var/www/html/app".to_string()));
        assert_eq!(
            DockerCli::exec_args("c_php", &invocation, true),
            vec![
                "exec",
                "-i",
                "-t",
                "-w",
                "/var/www/html/app",
                "c_php",
                "composer",
                "require",
                "a b",
                "x;y"
            ]
        );
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let runtime = DockerCli::new("devtool-no-such-runtime");
        match runtime.list_running_containers() {
            Err(RuntimeError::Unavailable { binary, .. }) => {
                assert_eq!(binary, "devtool-no-such-runtime")
            }
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_tty_mode_overrides() {
        assert!(TtyMode::Always.resolve());
        assert!(!TtyMode::Never.resolve());
    }
}
