//! `devtool status` - which container each role resolves to

use serde::Serialize;

use crate::core::{Role, SelectError};
use crate::runtime::{ContainerRuntime, DockerCli};
use crate::settings::Settings;

use super::{SettingsArgs, StatusArgs};

#[derive(Debug, Serialize)]
pub struct RoleStatus {
    pub role: Role,
    pub pattern: String,
    /// Container the role dispatches to, if any
    pub container: Option<String>,
    /// Set when resolution failed, e.g. ambiguity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub runtime: String,
    pub runtime_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_error: Option<String>,
    pub running: Vec<String>,
    pub roles: Vec<RoleStatus>,
}

pub fn collect<R: ContainerRuntime>(runtime: &R, runtime_name: &str, settings: &Settings) -> StatusReport {
    let selector = settings.selector();
    let (running, runtime_error) = match runtime.list_running_containers() {
        Ok(running) => (running, None),
        Err(e) => (Vec::new(), Some(e.to_string())),
    };

    let roles = Role::ALL
        .into_iter()
        .map(|role| {
            let suffix = settings.suffixes.suffix(role);
            let (container, error) = match selector.select(suffix, &running) {
                Ok(found) => (found.map(str::to_string), None),
                Err(e @ SelectError::Ambiguous { .. }) => (None, Some(e.to_string())),
            };
            RoleStatus {
                role,
                pattern: selector.pattern(suffix),
                container,
                error,
            }
        })
        .collect();

    StatusReport {
        runtime: runtime_name.to_string(),
        runtime_available: runtime_error.is_none(),
        runtime_error,
        running,
        roles,
    }
}

fn render_text(report: &StatusReport) -> String {
    let mut text = String::new();
    match &report.runtime_error {
        None => text.push_str(&format!(
            "runtime: {} ({} running)\n",
            report.runtime,
            report.running.len()
        )),
        Some(e) => text.push_str(&format!("runtime: {}\n", e)),
    }
    for role in &report.roles {
        let target = match (&role.container, &role.error) {
            (Some(name), _) => name.clone(),
            (None, Some(e)) => format!("error: {}", e),
            (None, None) => "host (no matching container)".to_string(),
        };
        text.push_str(&format!(
            "{:<5} {:<20} -> {}\n",
            role.role.as_str(),
            role.pattern,
            target
        ));
    }
    text
}

pub fn run(args: StatusArgs, settings: &SettingsArgs) -> anyhow::Result<()> {
    let settings = settings.load()?;
    let runtime = DockerCli::new(&settings.runtime);
    let report = collect(&runtime, runtime.binary(), &settings);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_text(&report));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Invocation;
    use crate::host::ExecError;
    use crate::runtime::RuntimeError;
    use crate::settings::Overrides;

    struct Listing(Result<Vec<&'static str>, ()>);

    impl ContainerRuntime for Listing {
        fn list_running_containers(&self) -> Result<Vec<String>, RuntimeError> {
            match &self.0 {
                Ok(names) => Ok(names.iter().map(|s| s.to_string()).collect()),
                Err(()) => Err(RuntimeError::Unavailable {
                    binary: "docker".to_string(),
                    reason: "daemon not running".to_string(),
                }),
            }
        }

        fn exec_in_container(&self, _: &str, _: &Invocation) -> Result<i32, ExecError> {
            unreachable!("status never executes")
        }
    }

    fn settings() -> Settings {
        let dir = tempfile::tempdir().unwrap();
        Settings::load_from(dir.path(), &Overrides::default(), None).unwrap()
    }

    #[test]
    fn test_collect_resolves_roles() {
        let report = collect(
            &Listing(Ok(vec!["dev_container_php", "dev_container_mariadb"])),
            "docker",
            &settings(),
        );
        assert!(report.runtime_available);
        assert_eq!(report.roles[0].container.as_deref(), Some("dev_container_php"));
        assert_eq!(report.roles[1].container, None);

        let text = render_text(&report);
        assert!(text.contains("dev_container_php"));
        assert!(text.contains("host (no matching container)"));
    }

    #[test]
    fn test_collect_reports_ambiguity() {
        let report = collect(&Listing(Ok(vec!["a_node", "b_node"])), "docker", &settings());
        assert!(report.roles[1].error.as_deref().unwrap().contains("a_node, b_node"));
    }

    #[test]
    fn test_collect_runtime_unavailable() {
        let report = collect(&Listing(Err(())), "docker", &settings());
        assert!(!report.runtime_available);
        assert!(report.running.is_empty());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["runtime_available"], false);
        assert_eq!(json["roles"][0]["role"], "php");
    }
}
