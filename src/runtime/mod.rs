//! Container runtime abstraction
//!
//! The dispatcher only needs two capabilities from the runtime: list the
//! running containers and run a tool inside one of them. The scaffolder
//! additionally drives the compose project through [`ComposeRuntime`].

pub mod docker;

pub use docker::{DockerCli, TtyMode};

use thiserror::Error;

use crate::core::Invocation;
use crate::host::ExecError;

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The runtime CLI is missing, the daemon is down, or the query failed
    #[error("container runtime `{binary}` is unavailable: {reason}")]
    Unavailable { binary: String, reason: String },

    /// A runtime command ran but exited non-zero
    #[error("`{command}` exited with status {code}")]
    CommandFailed { command: String, code: i32 },
}

pub trait ContainerRuntime {
    /// Names of the running containers, in the order the runtime lists them
    fn list_running_containers(&self) -> Result<Vec<String>, RuntimeError>;

    /// Run a tool attached inside `container` and return its exit status
    fn exec_in_container(&self, container: &str, invocation: &Invocation) -> Result<i32, ExecError>;
}

impl<T: ContainerRuntime + ?Sized> ContainerRuntime for &T {
    fn list_running_containers(&self) -> Result<Vec<String>, RuntimeError> {
        (**self).list_running_containers()
    }

    fn exec_in_container(&self, container: &str, invocation: &Invocation) -> Result<i32, ExecError> {
        (**self).exec_in_container(container, invocation)
    }
}

/// Compose project lifecycle
pub trait ComposeRuntime {
    /// `compose up -d`
    fn compose_up(&self) -> Result<(), RuntimeError>;

    /// `compose restart <service>`
    fn compose_restart(&self, service: &str) -> Result<(), RuntimeError>;
}

impl<T: ComposeRuntime + ?Sized> ComposeRuntime for &T {
    fn compose_up(&self) -> Result<(), RuntimeError> {
        (**self).compose_up()
    }

    fn compose_restart(&self, service: &str) -> Result<(), RuntimeError> {
        (**self).compose_restart(service)
    }
}
