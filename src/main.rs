//! devtool - run PHP and Node tooling inside the local dev stack
//!
//! - `devtool run php -v` runs in the `<CONTAINER_NAME>_php` container when
//!   it is up, otherwise on the host with a warning
//! - `devtool shim install` puts `php`, `composer`, `npm`, `npx`, `node`
//!   wrappers on PATH
//! - `devtool new <name>` scaffolds a Laravel project wired to the stack

mod cli;
mod core;
mod dispatch;
mod host;
mod logging;
mod runtime;
mod scaffold;
mod settings;
mod shim;

use clap::Parser;
use cli::{exit_codes, Cli, Commands};

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose, cli.json_logs) {
        eprintln!("devtool: failed to initialize logging: {}", e);
        return exit_codes::UNEXPECTED_FAILURE;
    }

    let settings = cli.settings;
    let result = match cli.command {
        // Dispatched tools own the exit code
        Commands::Run(args) => cli::run::run(args, &settings),
        Commands::Exec(args) => cli::run::exec(args, &settings),
        Commands::Status(args) => cli::status::run(args, &settings).map(|()| exit_codes::SUCCESS),
        Commands::Shim(args) => cli::shim::run(args).map(|()| exit_codes::SUCCESS),
        Commands::New(args) => cli::new::run(args, &settings).map(|()| exit_codes::SUCCESS),
        Commands::Config(args) => cli::config::run(args, &settings).map(|()| exit_codes::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("devtool: {:#}", e);
            categorize_error(&e)
        }
    }
}

/// Categorize an error into the appropriate exit code
fn categorize_error(e: &anyhow::Error) -> i32 {
    use crate::core::{SelectError, UnknownTool};
    use crate::dispatch::DispatchError;
    use crate::host::ExecError;
    use crate::scaffold::ScaffoldError;
    use crate::settings::SettingsError;
    use crate::shim::ShimError;

    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<DispatchError>() {
            return match err {
                DispatchError::Ambiguous(_) => exit_codes::USAGE,
                DispatchError::Exec(ExecError::NotFound(_)) => exit_codes::TOOL_NOT_FOUND,
                _ => exit_codes::UNEXPECTED_FAILURE,
            };
        }
        if cause.is::<SelectError>() || cause.is::<UnknownTool>() || cause.is::<SettingsError>() {
            return exit_codes::USAGE;
        }
        if let Some(ExecError::NotFound(_)) = cause.downcast_ref::<ExecError>() {
            return exit_codes::TOOL_NOT_FOUND;
        }
        if let Some(
            ScaffoldError::InvalidName(_) | ScaffoldError::InvalidVersion(_) | ScaffoldError::NoProjectRoot,
        ) = cause.downcast_ref::<ScaffoldError>()
        {
            return exit_codes::USAGE;
        }
        if let Some(ShimError::UnknownTool(_) | ShimError::NoShimDir) = cause.downcast_ref::<ShimError>() {
            return exit_codes::USAGE;
        }
    }
    exit_codes::UNEXPECTED_FAILURE
}
