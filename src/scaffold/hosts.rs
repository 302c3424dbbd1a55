//! `/etc/hosts` entry for the project domain

use std::path::Path;
use std::process::Command;

use super::ScaffoldError;
use crate::host::exit_code;

pub const HOSTS_FILE: &str = "/etc/hosts";

/// Whether any non-comment line maps `host`
pub fn has_entry(contents: &str, host: &str) -> bool {
    contents.lines().any(|line| {
        let line = line.split('#').next().unwrap_or("");
        line.split_whitespace().skip(1).any(|name| name == host)
    })
}

pub fn entry_line(host: &str) -> String {
    format!("127.0.0.1 {}", host)
}

/// Append the entry through `sudo` unless it is already present
pub fn ensure_entry(hosts_file: &Path, host: &str) -> Result<bool, ScaffoldError> {
    match std::fs::read_to_string(hosts_file) {
        Ok(contents) if has_entry(&contents, host) => {
            tracing::debug!(host, "hosts entry already present");
            return Ok(false);
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(
            "could not read {} ({}), trying to append anyway",
            hosts_file.display(),
            e
        ),
    }

    let script = format!("echo '{}' >> '{}'", entry_line(host), hosts_file.display());
    let status = Command::new("sudo")
        .args(["sh", "-c", &script])
        .status()
        .map_err(|e| ScaffoldError::Hosts(format!("failed to run sudo: {}", e)))?;

    if status.success() {
        Ok(true)
    } else {
        Err(ScaffoldError::Hosts(format!(
            "sudo exited with status {}",
            exit_code(status)
        )))
    }
}
