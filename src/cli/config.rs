//! `devtool config` - print resolved settings

use crate::core::Role;
use crate::settings::{default_config_path, Settings};

use super::{ConfigArgs, SettingsArgs};

fn show_path(path: &Option<std::path::PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn render_text(settings: &Settings) -> String {
    let selector = settings.selector();
    let mut lines = vec![
        format!("config file:      {}", show_path(&settings.config_file)),
        format!("env file:         {}", show_path(&settings.env_file)),
        format!("project root:     {}", show_path(&settings.project_root)),
        format!("runtime:          {}", settings.runtime),
        format!(
            "container name:   {}",
            settings.container_name.as_deref().unwrap_or("- (match by suffix)")
        ),
        format!("on ambiguous:     {}", settings.on_ambiguous.as_str()),
        format!("tty:              {}", settings.tty.as_str()),
    ];
    for role in Role::ALL {
        lines.push(format!(
            "{:<5} container:  {}",
            role.as_str(),
            selector.pattern(settings.suffixes.suffix(role))
        ));
    }
    lines.push(format!(
        "source mapping:   {} -> {}",
        show_path(&settings.host_source_dir),
        settings.container_source_dir
    ));
    lines.push(format!("server port:      {}", settings.server_port));
    lines.push(format!("db port:          {}", settings.db_port));
    lines.join("\n")
}

pub fn run(args: ConfigArgs, settings: &SettingsArgs) -> anyhow::Result<()> {
    let settings = settings.load()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    } else {
        println!("{}", render_text(&settings));
        if settings.config_file.is_none() {
            if let Some(path) = default_config_path() {
                println!("(no config file; create {} to set defaults)", path.display());
            }
        }
    }
    Ok(())
}
