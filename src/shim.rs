//! Wrapper-script shims
//!
//! A shim is a tiny `sh` script named after a tool (`php`, `npm`, ...) that
//! execs `devtool run <tool> "$@"`. Installing shims into a directory early
//! on PATH gives the `php -v` experience without shell aliases.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::KNOWN_TOOLS;

/// Marker line identifying scripts we own
pub const SHIM_MARKER: &str = "# devtool-shim";

#[derive(Debug, Error)]
pub enum ShimError {
    #[error("refusing to overwrite {} which is not a devtool shim", .0.display())]
    WouldOverwrite(PathBuf),

    #[error("no shim available for '{0}' (known: {list})", list = KNOWN_TOOLS.join(", "))]
    UnknownTool(String),

    #[error("could not determine a shim directory; pass --dir")]
    NoShimDir,

    #[error("shims are only supported on unix hosts")]
    #[cfg_attr(unix, allow(dead_code))]
    Unsupported,

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-tool install state
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ShimStatus {
    pub tool: String,
    pub path: PathBuf,
    pub installed: bool,
}

/// Default install location: `~/.local/bin`
pub fn default_shim_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".local").join("bin"))
}

/// Validate requested tools, defaulting to all of them
pub fn normalize_tools(tools: Vec<String>) -> Result<Vec<String>, ShimError> {
    if tools.is_empty() {
        return Ok(KNOWN_TOOLS.iter().map(|t| t.to_string()).collect());
    }
    for tool in &tools {
        if !KNOWN_TOOLS.contains(&tool.as_str()) {
            return Err(ShimError::UnknownTool(tool.clone()));
        }
    }
    Ok(tools)
}

fn sh_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

pub fn shim_script(devtool: &Path, tool: &str) -> String {
    format!(
        "#!/bin/sh\n{marker}\nexec {exe} run {tool} \"$@\"\n",
        marker = SHIM_MARKER,
        exe = sh_quote(&devtool.display().to_string()),
        tool = tool,
    )
}

/// Whether `path` is a script written by [`install`]
pub fn is_devtool_shim(path: &Path) -> bool {
    // Shims are a few dozen bytes; avoid slurping real binaries
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() < 4096 => {}
        _ => return false,
    }
    fs::read(path)
        .map(|body| {
            String::from_utf8_lossy(&body)
                .lines()
                .any(|line| line.trim() == SHIM_MARKER)
        })
        .unwrap_or(false)
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ShimError + '_ {
    move |source| ShimError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(unix)]
fn write_shim(path: &Path, body: &str) -> Result<(), ShimError> {
    use std::os::unix::fs::PermissionsExt;
    fs::write(path, body).map_err(io_err(path))?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(io_err(path))?;
    Ok(())
}

#[cfg(not(unix))]
fn write_shim(_path: &Path, _body: &str) -> Result<(), ShimError> {
    Err(ShimError::Unsupported)
}

/// Write one shim per tool into `dir`. Existing foreign files are never
/// overwritten; the check runs for every tool before anything is written.
pub fn install(dir: &Path, tools: &[String], devtool: &Path) -> Result<Vec<PathBuf>, ShimError> {
    let targets: Vec<PathBuf> = tools.iter().map(|tool| dir.join(tool)).collect();
    for path in &targets {
        if path.exists() && !is_devtool_shim(path) {
            return Err(ShimError::WouldOverwrite(path.clone()));
        }
    }

    fs::create_dir_all(dir).map_err(io_err(dir))?;
    for (tool, path) in tools.iter().zip(&targets) {
        write_shim(path, &shim_script(devtool, tool))?;
        tracing::debug!(tool, path = %path.display(), "installed shim");
    }
    Ok(targets)
}

/// Remove our shims; foreign files are left alone
pub fn uninstall(dir: &Path, tools: &[String]) -> Result<Vec<ShimStatus>, ShimError> {
    let mut removed = Vec::with_capacity(tools.len());
    for tool in tools {
        let path = dir.join(tool);
        let ours = is_devtool_shim(&path);
        if ours {
            fs::remove_file(&path).map_err(io_err(&path))?;
        }
        removed.push(ShimStatus {
            tool: tool.clone(),
            path,
            installed: ours,
        });
    }
    Ok(removed)
}

pub fn list(dir: &Path, tools: &[String]) -> Vec<ShimStatus> {
    tools
        .iter()
        .map(|tool| {
            let path = dir.join(tool);
            ShimStatus {
                tool: tool.clone(),
                installed: is_devtool_shim(&path),
                path,
            }
        })
        .collect()
}
