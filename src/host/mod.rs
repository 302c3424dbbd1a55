//! Host module for process management and command execution

pub mod command_runner;

pub use command_runner::{exit_code, CommandRunner, ExecError, NOT_FOUND_EXIT};

use crate::core::Invocation;

/// Runs a tool directly on the local machine with inherited stdio
pub trait HostExecutor {
    /// Run to completion and return the exit status
    fn exec_on_host(&self, invocation: &Invocation) -> Result<i32, ExecError>;
}

impl<T: HostExecutor + ?Sized> HostExecutor for &T {
    fn exec_on_host(&self, invocation: &Invocation) -> Result<i32, ExecError> {
        (**self).exec_on_host(invocation)
    }
}
