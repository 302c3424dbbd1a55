//! The `devtool new` workflow

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::{Invocation, Role};
use crate::runtime::{ComposeRuntime, ContainerRuntime};
use crate::settings::Settings;

use super::{env_file, hosts, naming, vhost, vite, ScaffoldError, DEFAULT_CONTAINER_NAME};

/// Everything the workflow needs, resolved up front
#[derive(Debug, Clone)]
pub struct ScaffoldPlan {
    pub name: String,
    pub host: String,
    pub laravel_version: u8,
    pub project_root: PathBuf,
    pub host_source_dir: PathBuf,
    pub container_source_dir: String,
    pub php_container: String,
    pub node_container: String,
    pub server_port: u16,
    pub db_port: u16,
    pub db_password: String,
    pub update_hosts: bool,
    pub restart_apache: bool,
}

impl ScaffoldPlan {
    pub fn from_settings(
        settings: &Settings,
        raw_name: &str,
        version: Option<&str>,
    ) -> Result<Self, ScaffoldError> {
        let name = naming::project_name(raw_name)?;
        let laravel_version = naming::laravel_version(version)?;
        let project_root = settings
            .project_root
            .clone()
            .ok_or(ScaffoldError::NoProjectRoot)?;
        let host_source_dir = settings
            .host_source_dir
            .clone()
            .unwrap_or_else(|| project_root.join("src"));

        let prefix = settings
            .container_name
            .as_deref()
            .unwrap_or(DEFAULT_CONTAINER_NAME);

        Ok(Self {
            host: format!("{}.test", name),
            php_container: format!("{}{}", prefix, settings.suffixes.suffix(Role::Php)),
            node_container: format!("{}{}", prefix, settings.suffixes.suffix(Role::Node)),
            name,
            laravel_version,
            project_root,
            host_source_dir,
            container_source_dir: settings.container_source_dir.clone(),
            server_port: settings.server_port,
            db_port: settings.db_port,
            db_password: settings.db_root_password.clone(),
            update_hosts: true,
            restart_apache: true,
        })
    }

    pub fn project_dir(&self) -> PathBuf {
        self.host_source_dir.join(&self.name)
    }

    pub fn container_project_dir(&self) -> String {
        format!("{}/{}", self.container_source_dir.trim_end_matches('/'), self.name)
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.server_port)
    }
}

/// How long to wait for the php container after `compose up`
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            interval: Duration::from_secs(3),
        }
    }
}

pub struct Scaffolder<R> {
    runtime: R,
    wait: WaitPolicy,
    hosts_file: PathBuf,
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ScaffoldError + '_ {
    move |source| ScaffoldError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn sh(command: String) -> Vec<String> {
    vec!["-c".to_string(), command]
}

/// `sh -c` body writing `$2` to the file `$1`; contents travel as an argument
const WRITE_FILE_SCRIPT: &str = r#"printf '%s' "$2" > "$1""#;

impl<R: ContainerRuntime + ComposeRuntime> Scaffolder<R> {
    pub fn new(runtime: R) -> Self {
        Self {
            runtime,
            wait: WaitPolicy::default(),
            hosts_file: PathBuf::from(hosts::HOSTS_FILE),
        }
    }

    #[cfg(test)]
    pub fn with_wait(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    #[cfg(test)]
    pub fn with_hosts_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.hosts_file = path.into();
        self
    }

    /// A failed listing counts as "not running" so `compose up` still gets a try
    fn is_running(&self, container: &str) -> bool {
        match self.runtime.list_running_containers() {
            Ok(running) => running.iter().any(|name| name == container),
            Err(e) => {
                tracing::warn!("could not list containers: {}", e);
                false
            }
        }
    }

    /// Start the compose project if `container` is down and poll until it is up
    pub fn ensure_running(&self, container: &str, out: &mut dyn Write) -> Result<(), ScaffoldError> {
        if self.is_running(container) {
            writeln!(out, "Container {} is running.", container)?;
            return Ok(());
        }

        writeln!(out, "Container {} is not running, starting the compose stack...", container)?;
        self.runtime.compose_up()?;

        for attempt in 1..=self.wait.attempts {
            writeln!(
                out,
                "Waiting for {} (attempt {} of {})...",
                container, attempt, self.wait.attempts
            )?;
            std::thread::sleep(self.wait.interval);
            if self.is_running(container) {
                writeln!(out, "Container {} is up.", container)?;
                return Ok(());
            }
        }

        Err(ScaffoldError::ContainerNotRunning {
            container: container.to_string(),
            attempts: self.wait.attempts,
        })
    }

    fn exec_step(
        &self,
        step: &'static str,
        container: &str,
        invocation: Invocation,
        out: &mut dyn Write,
    ) -> Result<(), ScaffoldError> {
        writeln!(out, ">> {}", step)?;
        tracing::debug!(step, container, command = %invocation.display(), "scaffold step");
        match self.runtime.exec_in_container(container, &invocation)? {
            0 => Ok(()),
            code => Err(ScaffoldError::Step { step, code }),
        }
    }

    /// Replace a project file from inside the php container. Files created
    /// by `composer create-project` belong to the container user, so the
    /// host may only be able to read them.
    fn write_project_file(
        &self,
        step: &'static str,
        plan: &ScaffoldPlan,
        file: &str,
        contents: String,
        out: &mut dyn Write,
    ) -> Result<(), ScaffoldError> {
        writeln!(out, ">> {}", step)?;
        // Contents may hold credentials; keep them out of the log
        tracing::debug!(step, file, bytes = contents.len(), "writing project file in container");
        let invocation = Invocation::new(
            "sh",
            vec![
                "-c".to_string(),
                WRITE_FILE_SCRIPT.to_string(),
                "sh".to_string(),
                file.to_string(),
                contents,
            ],
        )
        .with_workdir(Some(plan.container_project_dir()));
        match self.runtime.exec_in_container(&plan.php_container, &invocation)? {
            0 => Ok(()),
            code => Err(ScaffoldError::Step { step, code }),
        }
    }

    fn configure_env(&self, plan: &ScaffoldPlan, out: &mut dyn Write) -> Result<(), ScaffoldError> {
        let path = plan.project_dir().join(".env");
        let contents = fs::read_to_string(&path).map_err(io_err(&path))?;
        let updates = env_file::database_updates(&plan.name, &plan.host, plan.db_port, &plan.db_password);
        let rewritten = env_file::apply_updates(&contents, &updates)?;
        self.write_project_file("Configuring .env", plan, ".env", rewritten, out)
    }

    fn configure_vite(&self, plan: &ScaffoldPlan, out: &mut dyn Write) -> Result<(), ScaffoldError> {
        let path = plan.project_dir().join("vite.config.js");
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no vite config, skipping");
            return Ok(());
        }
        let contents = fs::read_to_string(&path).map_err(io_err(&path))?;
        match vite::patch_config(&contents) {
            Some(patched) => {
                self.write_project_file("Configuring vite.config.js", plan, "vite.config.js", patched, out)?;
            }
            None => tracing::debug!("vite config already patched"),
        }
        Ok(())
    }

    fn write_vhost(&self, plan: &ScaffoldPlan, out: &mut dyn Write) -> Result<PathBuf, ScaffoldError> {
        let path = vhost::vhost_path(&plan.project_root, &plan.host);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(io_err(dir))?;
        }
        let conf = vhost::render(&plan.name, &plan.host, &plan.container_source_dir);
        fs::write(&path, conf).map_err(io_err(&path))?;
        writeln!(out, "Vhost written to {}", path.display())?;
        Ok(path)
    }

    /// Run the whole workflow; the first failing step aborts it
    pub fn run(&self, plan: &ScaffoldPlan, out: &mut dyn Write) -> Result<(), ScaffoldError> {
        let project_dir = plan.project_dir();
        if project_dir.exists() {
            return Err(ScaffoldError::ProjectExists(project_dir));
        }

        self.ensure_running(&plan.php_container, out)?;

        let source_dir = Some(plan.container_source_dir.clone());
        self.exec_step(
            "composer create-project",
            &plan.php_container,
            Invocation::new(
                "composer",
                vec![
                    "create-project".to_string(),
                    "laravel/laravel".to_string(),
                    plan.name.clone(),
                    plan.laravel_version.to_string(),
                ],
            )
            .with_workdir(source_dir),
            out,
        )?;

        self.configure_env(plan, out)?;

        let app_dir = Some(plan.container_project_dir());
        for (step, command) in [
            ("php artisan config:clear", "php artisan config:clear"),
            ("php artisan migrate", "php artisan migrate --force"),
            ("composer update", "composer update"),
        ] {
            self.exec_step(
                step,
                &plan.php_container,
                Invocation::new("sh", sh(command.to_string())).with_workdir(app_dir.clone()),
                out,
            )?;
        }
        self.exec_step(
            "npm install",
            &plan.node_container,
            Invocation::new("sh", sh("npm install".to_string())).with_workdir(app_dir),
            out,
        )?;

        self.configure_vite(plan, out)?;
        self.write_vhost(plan, out)?;

        if plan.update_hosts {
            if hosts::ensure_entry(&self.hosts_file, &plan.host)? {
                writeln!(out, "Added {} to {}", plan.host, self.hosts_file.display())?;
            } else {
                writeln!(out, "{} already present in {}", plan.host, self.hosts_file.display())?;
            }
        }

        if plan.restart_apache {
            writeln!(out, ">> Restarting apache")?;
            self.runtime.compose_restart("apache")?;
        }

        writeln!(out, "Laravel project '{}' created at {}", plan.name, project_dir.display())?;
        writeln!(out, "Open {}", plan.url())?;
        Ok(())
    }
}
