//! `devtool shim` command

use std::path::PathBuf;

use anyhow::Context;

use crate::shim::{self, ShimError};

use super::{ShimArgs, ShimCommand};

fn resolve_dir(dir: Option<PathBuf>) -> Result<PathBuf, ShimError> {
    dir.or_else(shim::default_shim_dir).ok_or(ShimError::NoShimDir)
}

fn path_contains(dir: &std::path::Path) -> bool {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).any(|p| p == dir))
        .unwrap_or(false)
}

pub fn run(args: ShimArgs) -> anyhow::Result<()> {
    match args.command {
        ShimCommand::Install { dir, tools } => {
            let dir = resolve_dir(dir)?;
            let tools = shim::normalize_tools(tools)?;
            let exe = std::env::current_exe().context("failed to locate the devtool executable")?;

            for path in shim::install(&dir, &tools, &exe)? {
                println!("installed {}", path.display());
            }
            if !path_contains(&dir) {
                eprintln!(
                    "devtool: note: {} is not on PATH; add it before the real tools to use the shims",
                    dir.display()
                );
            }
        }
        ShimCommand::Uninstall { dir, tools } => {
            let dir = resolve_dir(dir)?;
            let tools = shim::normalize_tools(tools)?;
            for status in shim::uninstall(&dir, &tools)? {
                if status.installed {
                    println!("removed {}", status.path.display());
                } else {
                    println!("skipped {} (not a devtool shim)", status.path.display());
                }
            }
        }
        ShimCommand::List { dir, json } => {
            let dir = resolve_dir(dir)?;
            let statuses = shim::list(&dir, &shim::normalize_tools(Vec::new())?);
            if json {
                println!("{}", serde_json::to_string_pretty(&statuses)?);
            } else {
                for status in statuses {
                    let state = if status.installed { "installed" } else { "-" };
                    println!("{:<9} {:<10} {}", status.tool, state, status.path.display());
                }
            }
        }
    }
    Ok(())
}
