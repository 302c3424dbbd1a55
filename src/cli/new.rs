//! `devtool new` - scaffold a Laravel project

use anyhow::Context;

use crate::runtime::DockerCli;
use crate::scaffold::{ScaffoldPlan, Scaffolder};

use super::{NewArgs, SettingsArgs};

pub fn run(args: NewArgs, settings: &SettingsArgs) -> anyhow::Result<()> {
    let settings = settings.load()?;
    let mut plan = ScaffoldPlan::from_settings(&settings, &args.name, args.laravel_version.as_deref())?;
    plan.update_hosts = !args.skip_hosts;
    plan.restart_apache = !args.skip_restart;

    let mut out = std::io::stdout();
    if plan.name != args.name.trim() {
        println!("Project name normalized: '{}' -> '{}'", args.name.trim(), plan.name);
    }
    println!(
        "Creating Laravel {} project '{}' ({})",
        plan.laravel_version, plan.name, plan.host
    );

    let runtime = DockerCli::new(&settings.runtime).with_project_dir(Some(plan.project_root.clone()));
    Scaffolder::new(runtime)
        .run(&plan, &mut out)
        .with_context(|| format!("failed to create project '{}'", plan.name))
}
