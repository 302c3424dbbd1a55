//! Command-line interface

pub mod config;
pub mod new;
pub mod run;
pub mod shim;
pub mod status;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::core::{AmbiguityPolicy, Role};
use crate::settings::{Overrides, Settings, SettingsError};

/// Process exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const UNEXPECTED_FAILURE: i32 = 1;
    /// Bad configuration, unknown tool, or ambiguous container match
    pub const USAGE: i32 = 2;
    pub const TOOL_NOT_FOUND: i32 = crate::host::NOT_FOUND_EXIT;
}

#[derive(Parser, Debug)]
#[command(
    name = "devtool",
    version,
    about = "Run php, composer, npm, npx and node inside the dev stack containers",
    long_about = "Run php, composer, npm, npx and node inside the running dev stack \
                  containers (<CONTAINER_NAME>_php, <CONTAINER_NAME>_node). When no \
                  matching container is running the tool runs on the host instead."
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long = "json-logs", global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags layered over the config file and project `.env`
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Config file (default: <config dir>/devtool/config.toml)
    #[arg(long, global = true, env = "DEVTOOL_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Container runtime CLI (docker, podman)
    #[arg(long, global = true, env = "DEVTOOL_RUNTIME")]
    pub runtime: Option<String>,

    /// Compose project prefix; only `<name>_php` / `<name>_node` will match
    #[arg(long, global = true, env = "DEVTOOL_CONTAINER_NAME")]
    pub container_name: Option<String>,

    /// What to do when several containers share a role suffix
    #[arg(long, global = true, value_enum, env = "DEVTOOL_ON_AMBIGUOUS")]
    pub on_ambiguous: Option<AmbiguityPolicy>,
}

impl SettingsArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            config_path: self.config.clone(),
            runtime: self.runtime.clone(),
            container_name: self.container_name.clone(),
            on_ambiguous: self.on_ambiguous,
        }
    }

    pub fn load(&self) -> Result<Settings, SettingsError> {
        Settings::load(&self.overrides())
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run php, composer, npm, npx or node in its container
    Run(RunArgs),

    /// Run any tool in the container of the given role
    Exec(ExecArgs),

    /// Show which container each role resolves to
    Status(StatusArgs),

    /// Manage wrapper scripts that route `php`, `npm`, ... through devtool
    Shim(ShimArgs),

    /// Create a new Laravel project in the dev stack
    New(NewArgs),

    /// Print the resolved settings
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Tool followed by its arguments, forwarded verbatim
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "TOOL [ARGS]"
    )]
    pub argv: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Container role to run in
    #[arg(long, value_enum)]
    pub role: Role,

    /// Tool followed by its arguments, forwarded verbatim
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "TOOL [ARGS]"
    )]
    pub argv: Vec<String>,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ShimArgs {
    #[command(subcommand)]
    pub command: ShimCommand,
}

#[derive(Subcommand, Debug)]
pub enum ShimCommand {
    /// Write shims (default: all known tools)
    Install {
        /// Target directory (default: ~/.local/bin)
        #[arg(long)]
        dir: Option<PathBuf>,
        tools: Vec<String>,
    },
    /// Remove shims written by devtool
    Uninstall {
        #[arg(long)]
        dir: Option<PathBuf>,
        tools: Vec<String>,
    },
    /// Show which shims are installed
    List {
        #[arg(long)]
        dir: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct NewArgs {
    /// Project name; normalized to kebab-case
    pub name: String,

    /// Laravel major version (minimum 10)
    #[arg(long, value_name = "VERSION")]
    pub laravel_version: Option<String>,

    /// Do not add `<name>.test` to /etc/hosts
    #[arg(long)]
    pub skip_hosts: bool,

    /// Do not restart the apache service afterwards
    #[arg(long)]
    pub skip_restart: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_forwards_hyphen_args() {
        let cli = Cli::try_parse_from(["devtool", "run", "php", "-v", "--verbose", "-d", "x=1"]).unwrap();
        assert!(!cli.verbose);
        match cli.command {
            Commands::Run(args) => assert_eq!(args.argv, vec!["php", "-v", "--verbose", "-d", "x=1"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_before_subcommand() {
        let cli = Cli::try_parse_from([
            "devtool",
            "--verbose",
            "--container-name",
            "shop",
            "--on-ambiguous",
            "first",
            "run",
            "npm",
            "install",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.settings.container_name.as_deref(), Some("shop"));
        assert_eq!(cli.settings.on_ambiguous, Some(AmbiguityPolicy::First));
    }

    #[test]
    fn test_exec_requires_role() {
        assert!(Cli::try_parse_from(["devtool", "exec", "artisan"]).is_err());
        let cli = Cli::try_parse_from(["devtool", "exec", "--role", "php", "vendor/bin/phpunit", "--filter", "Foo"]).unwrap();
        match cli.command {
            Commands::Exec(args) => {
                assert_eq!(args.role, Role::Php);
                assert_eq!(args.argv, vec!["vendor/bin/phpunit", "--filter", "Foo"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_run_requires_tool() {
        assert!(Cli::try_parse_from(["devtool", "run"]).is_err());
    }
}
