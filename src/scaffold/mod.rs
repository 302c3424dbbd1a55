//! Laravel project scaffolding
//!
//! Creates a new Laravel app inside the php container, wires it to the
//! stack's MariaDB, patches Vite for container access, and publishes an
//! Apache vhost plus a hosts entry for `<name>.test`.

pub mod env_file;
pub mod hosts;
pub mod naming;
pub mod project;
pub mod vhost;
pub mod vite;

pub use project::{ScaffoldPlan, Scaffolder};

use std::path::PathBuf;

use thiserror::Error;

use crate::host::ExecError;
use crate::runtime::RuntimeError;

/// Compose project prefix when `CONTAINER_NAME` is not configured
pub const DEFAULT_CONTAINER_NAME: &str = "dev_container";

#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("invalid project name: {0}")]
    InvalidName(String),

    #[error("invalid Laravel version: {0}")]
    InvalidVersion(String),

    #[error("could not find the dev stack root (a directory containing docker/) here or in the parent directory")]
    NoProjectRoot,

    #[error("{} already exists", .0.display())]
    ProjectExists(PathBuf),

    #[error("container '{container}' is not running after {attempts} checks")]
    ContainerNotRunning { container: String, attempts: u32 },

    #[error("{step} failed with exit status {code}")]
    Step { step: &'static str, code: i32 },

    #[error("invalid .env key pattern: {0}")]
    EnvPattern(#[from] regex_lite::Error),

    #[error("updating hosts file: {0}")]
    Hosts(String),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write progress output: {0}")]
    Output(#[from] std::io::Error),
}
