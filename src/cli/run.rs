//! `devtool run` and `devtool exec`

use anyhow::Context;

use crate::core::DispatchRequest;
use crate::dispatch::{Dispatcher, Target};
use crate::host::CommandRunner;
use crate::runtime::DockerCli;
use crate::settings::Settings;

use super::{ExecArgs, RunArgs, SettingsArgs};

/// Exported to host-fallback children so scripts can tell they were not containerized
const DISPATCH_ENV: &str = "DEVTOOL_DISPATCHED";

pub fn run(args: RunArgs, settings: &SettingsArgs) -> anyhow::Result<i32> {
    let request = DispatchRequest::from_argv(args.argv)?;
    dispatch(&request, &settings.load()?)
}

pub fn exec(args: ExecArgs, settings: &SettingsArgs) -> anyhow::Result<i32> {
    let mut argv = args.argv;
    let tool = argv.remove(0);
    let request = DispatchRequest::new(tool, argv, args.role);
    dispatch(&request, &settings.load()?)
}

fn dispatch(request: &DispatchRequest, settings: &Settings) -> anyhow::Result<i32> {
    let cwd = std::env::current_dir().context("failed to read the current directory")?;

    let dispatcher = Dispatcher::new(
        DockerCli::new(&settings.runtime).with_tty(settings.tty),
        CommandRunner::new().with_env(DISPATCH_ENV, "host"),
    )
    .with_selector(settings.selector())
    .with_suffixes(settings.suffixes.clone())
    .with_container_workdir(settings.container_workdir(&cwd));

    let outcome = dispatcher.dispatch(request, &mut std::io::stderr())?;
    match &outcome.target {
        Target::Container(name) => {
            tracing::debug!(container = %name, exit_code = outcome.exit_code, "tool finished")
        }
        Target::Host(_) => tracing::debug!(exit_code = outcome.exit_code, "tool finished on host"),
    }
    Ok(outcome.exit_code)
}
