//! Settings
//!
//! Layered, lowest precedence first: built-in defaults, the TOML config
//! file, the project `.env`, then `DEVTOOL_*` variables and flags (handled
//! by clap and passed in as [`Overrides`]). The project `.env` is read
//! without touching the process environment.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{AmbiguityPolicy, ContainerSelector, RoleSuffixes};
use crate::runtime::TtyMode;

pub const ENV_FILE: &str = ".env";
pub const DEFAULT_RUNTIME: &str = "docker";
pub const DEFAULT_CONTAINER_SOURCE_DIR: &str = "/var/www/html";
pub const DEFAULT_SERVER_PORT: u16 = 8000;
pub const DEFAULT_DB_PORT: u16 = 3306;
pub const DEFAULT_DB_ROOT_PASSWORD: &str = "password";
/// Directory whose presence marks the dev stack root
const PROJECT_MARKER_DIR: &str = "docker";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("config file {} not found", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid env file {}: {source}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

/// Values supplied on the command line or via `DEVTOOL_*` variables
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub runtime: Option<String>,
    pub container_name: Option<String>,
    pub on_ambiguous: Option<AmbiguityPolicy>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    runtime: Option<String>,
    container_name: Option<String>,
    on_ambiguous: Option<AmbiguityPolicy>,
    tty: Option<TtyMode>,
    container_source_dir: Option<String>,
    host_source_dir: Option<PathBuf>,
    roles: RoleConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RoleConfig {
    php_suffix: Option<String>,
    node_suffix: Option<String>,
}

/// Fully resolved settings
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub runtime: String,
    /// `CONTAINER_NAME`; when set only exact `<name><suffix>` containers match
    pub container_name: Option<String>,
    pub on_ambiguous: AmbiguityPolicy,
    /// Pseudo-terminal allocation for container execs
    pub tty: TtyMode,
    pub suffixes: RoleSuffixes,
    pub project_root: Option<PathBuf>,
    pub host_source_dir: Option<PathBuf>,
    pub container_source_dir: String,
    pub server_port: u16,
    pub db_port: u16,
    #[serde(serialize_with = "redacted")]
    pub db_root_password: String,
    pub env_file: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
}

fn redacted<S: serde::Serializer>(_: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str("[REDACTED]")
}

/// `~/.config/devtool/config.toml` (platform equivalent)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("devtool").join("config.toml"))
}

/// Look for `name` in `base`, then in its parent
pub fn find_in_self_or_parent(base: &Path, name: &str) -> Option<PathBuf> {
    [base.to_path_buf(), base.join("..")]
        .into_iter()
        .map(|dir| dir.join(name))
        .find(|path| path.exists())
}

/// Nearest of `base` and its ancestors that contains a `docker/` directory
pub fn find_project_root(base: &Path) -> Option<PathBuf> {
    let base = base.canonicalize().unwrap_or_else(|_| base.to_path_buf());
    base.ancestors()
        .find(|dir| dir.join(PROJECT_MARKER_DIR).is_dir())
        .map(Path::to_path_buf)
}

/// The stack `.env` lives at the project root; outside a stack fall back to
/// `.` and `..`
fn find_env_file(base: &Path, project_root: Option<&Path>) -> Option<PathBuf> {
    match project_root {
        Some(root) => Some(root.join(ENV_FILE)).filter(|path| path.exists()),
        None => find_in_self_or_parent(base, ENV_FILE),
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>, SettingsError> {
    let iter = dotenvy::from_path_iter(path).map_err(|source| SettingsError::EnvFile {
        path: path.to_path_buf(),
        source,
    })?;
    iter.map(|item| {
        item.map_err(|source| SettingsError::EnvFile {
            path: path.to_path_buf(),
            source,
        })
    })
    .collect()
}

fn read_file_config(path: &Path) -> Result<FileConfig, SettingsError> {
    let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| SettingsError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn port_from_env(env: &HashMap<String, String>, key: &str, default: u16) -> u16 {
    match env.get(key).map(|v| v.trim()) {
        Some(raw) if !raw.is_empty() => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("{} ('{}') is not a valid port, using {}", key, raw, default);
            default
        }),
        _ => default,
    }
}

impl Settings {
    /// Resolve settings for the current directory
    pub fn load(overrides: &Overrides) -> Result<Self, SettingsError> {
        let cwd = std::env::current_dir().map_err(|source| SettingsError::Read {
            path: PathBuf::from("."),
            source,
        })?;
        Self::load_from(&cwd, overrides, default_config_path())
    }

    /// Resolve settings as seen from `base_dir`. `default_config` is used
    /// only when it exists and no explicit config path was given.
    pub fn load_from(
        base_dir: &Path,
        overrides: &Overrides,
        default_config: Option<PathBuf>,
    ) -> Result<Self, SettingsError> {
        let config_file = match &overrides.config_path {
            Some(path) if !path.exists() => return Err(SettingsError::ConfigNotFound(path.clone())),
            Some(path) => Some(path.clone()),
            None => default_config.filter(|path| path.exists()),
        };
        let file = match &config_file {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config file");
                read_file_config(path)?
            }
            None => FileConfig::default(),
        };

        let project_root = find_project_root(base_dir);
        let env_file = find_env_file(base_dir, project_root.as_deref());
        let env = match &env_file {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading project env file");
                read_env_file(path)?
            }
            None => HashMap::new(),
        };

        let host_source_dir = file
            .host_source_dir
            .map(|dir| dir.canonicalize().unwrap_or(dir))
            .or_else(|| project_root.as_ref().map(|root| root.join("src")));

        let defaults = RoleSuffixes::default();
        let suffixes = RoleSuffixes {
            php: file.roles.php_suffix.unwrap_or(defaults.php),
            node: file.roles.node_suffix.unwrap_or(defaults.node),
        };

        let container_name = non_blank(overrides.container_name.clone())
            .or_else(|| non_blank(env.get("CONTAINER_NAME").cloned()))
            .or_else(|| non_blank(file.container_name));

        Ok(Self {
            runtime: non_blank(overrides.runtime.clone())
                .or_else(|| non_blank(file.runtime))
                .unwrap_or_else(|| DEFAULT_RUNTIME.to_string()),
            container_name,
            on_ambiguous: overrides
                .on_ambiguous
                .or(file.on_ambiguous)
                .unwrap_or_default(),
            tty: file.tty.unwrap_or_default(),
            suffixes,
            project_root,
            host_source_dir,
            container_source_dir: non_blank(file.container_source_dir)
                .unwrap_or_else(|| DEFAULT_CONTAINER_SOURCE_DIR.to_string()),
            server_port: port_from_env(&env, "SERVER_PORT", DEFAULT_SERVER_PORT),
            db_port: port_from_env(&env, "DB_PORT", DEFAULT_DB_PORT),
            db_root_password: non_blank(env.get("DB_ROOT_PASSWORD").cloned())
                .unwrap_or_else(|| DEFAULT_DB_ROOT_PASSWORD.to_string()),
            env_file,
            config_file,
        })
    }

    pub fn selector(&self) -> ContainerSelector {
        ContainerSelector::new(self.container_name.clone(), self.on_ambiguous)
    }

    /// Container path mirroring `cwd` when it lies inside the host source
    /// directory
    pub fn container_workdir(&self, cwd: &Path) -> Option<String> {
        let source = self.host_source_dir.as_ref()?;
        let cwd = cwd.canonicalize().unwrap_or_else(|_| cwd.to_path_buf());
        let relative = cwd.strip_prefix(source).ok()?;

        let mut workdir = self.container_source_dir.trim_end_matches('/').to_string();
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    workdir.push('/');
                    workdir.push_str(part.to_str()?);
                }
                Component::CurDir => {}
                _ => return None,
            }
        }
        if workdir.is_empty() {
            workdir.push('/');
        }
        Some(workdir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn load(dir: &Path, overrides: &Overrides) -> Settings {
        Settings::load_from(dir, overrides, None).unwrap()
    }

    #[test]
    fn test_defaults_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load(dir.path(), &Overrides::default());

        assert_eq!(settings.runtime, "docker");
        assert_eq!(settings.container_name, None);
        assert_eq!(settings.on_ambiguous, AmbiguityPolicy::Error);
        assert_eq!(settings.tty, TtyMode::Auto);
        assert_eq!(settings.suffixes, RoleSuffixes::default());
        assert_eq!(settings.server_port, 8000);
        assert_eq!(settings.db_port, 3306);
        assert_eq!(settings.db_root_password, "password");
        assert_eq!(settings.project_root, None);
        assert_eq!(settings.env_file, None);
    }

    #[test]
    fn test_env_file_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(".env"),
            "CONTAINER_NAME=shop\nSERVER_PORT=8080\nDB_PORT=not-a-port\nDB_ROOT_PASSWORD=\"s3cret\"\n",
        )
        .unwrap();
        let child = dir.path().join("tools");
        fs::create_dir(&child).unwrap();

        let settings = load(&child, &Overrides::default());
        assert_eq!(settings.container_name.as_deref(), Some("shop"));
        assert_eq!(settings.server_port, 8080);
        assert_eq!(settings.db_port, 3306);
        assert_eq!(settings.db_root_password, "s3cret");
        assert!(settings.env_file.is_some());
    }

    #[test]
    fn test_env_file_does_not_leak_into_process_env() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".env"), "DEVTOOL_TEST_ONLY_KEY=1\n").unwrap();
        load(dir.path(), &Overrides::default());
        assert!(std::env::var("DEVTOOL_TEST_ONLY_KEY").is_err());
    }

    #[test]
    fn test_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.toml");
        fs::write(
            &config,
            r#"
runtime = "podman"
container_name = "from_toml"
on_ambiguous = "first"
tty = "never"

[roles]
php_suffix = "-fpm"
"#,
        )
        .unwrap();

        let overrides = Overrides {
            config_path: Some(config.clone()),
            ..Default::default()
        };
        let settings = load(dir.path(), &overrides);
        assert_eq!(settings.runtime, "podman");
        assert_eq!(settings.container_name.as_deref(), Some("from_toml"));
        assert_eq!(settings.on_ambiguous, AmbiguityPolicy::First);
        assert_eq!(settings.tty, TtyMode::Never);
        assert_eq!(settings.suffixes.php, "-fpm");
        assert_eq!(settings.suffixes.node, "_node");

        // .env beats the TOML file
        fs::write(dir.path().join(".env"), "CONTAINER_NAME=from_env\n").unwrap();
        let settings = load(dir.path(), &overrides);
        assert_eq!(settings.container_name.as_deref(), Some("from_env"));

        // flags beat everything
        let overrides = Overrides {
            config_path: Some(config),
            runtime: Some("docker".to_string()),
            container_name: Some("from_flag".to_string()),
            on_ambiguous: Some(AmbiguityPolicy::Error),
        };
        let settings = load(dir.path(), &overrides);
        assert_eq!(settings.runtime, "docker");
        assert_eq!(settings.container_name.as_deref(), Some("from_flag"));
        assert_eq!(settings.on_ambiguous, AmbiguityPolicy::Error);
    }

    #[test]
    fn test_blank_container_name_is_unset() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".env"), "CONTAINER_NAME=\"  \"\n").unwrap();
        let settings = load(dir.path(), &Overrides::default());
        assert_eq!(settings.container_name, None);
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = Overrides {
            config_path: Some(dir.path().join("nope.toml")),
            ..Default::default()
        };
        assert!(matches!(
            Settings::load_from(dir.path(), &overrides, None),
            Err(SettingsError::ConfigNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_policy_in_toml() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.toml");
        fs::write(&config, "on_ambiguous = \"random\"\n").unwrap();
        let overrides = Overrides {
            config_path: Some(config),
            ..Default::default()
        };
        assert!(matches!(
            Settings::load_from(dir.path(), &overrides, None),
            Err(SettingsError::Toml { .. })
        ));
    }

    #[test]
    fn test_container_workdir_mapping() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docker")).unwrap();
        fs::create_dir_all(dir.path().join("src").join("shop").join("app")).unwrap();

        let settings = load(dir.path(), &Overrides::default());
        let root = dir.path().canonicalize().unwrap();
        assert_eq!(settings.project_root.as_deref(), Some(root.as_path()));

        let src = dir.path().join("src");
        assert_eq!(settings.container_workdir(&src).as_deref(), Some("/var/www/html"));
        assert_eq!(
            settings
                .container_workdir(&src.join("shop").join("app"))
                .as_deref(),
            Some("/var/www/html/shop/app")
        );
        assert_eq!(settings.container_workdir(dir.path()), None);
    }

    #[test]
    fn test_load_from_inside_a_project() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docker")).unwrap();
        fs::write(dir.path().join(".env"), "CONTAINER_NAME=shop_stack\nSERVER_PORT=8081\n").unwrap();
        let project = dir.path().join("src").join("shop");
        fs::create_dir_all(project.join("app")).unwrap();
        // Laravel's own .env must not shadow the stack's
        fs::write(project.join(".env"), "APP_NAME=Laravel\nDB_PORT=3306\n").unwrap();

        let root = dir.path().canonicalize().unwrap();
        for (cwd, expected) in [
            (project.clone(), "/var/www/html/shop"),
            (project.join("app"), "/var/www/html/shop/app"),
        ] {
            let settings = load(&cwd, &Overrides::default());
            assert_eq!(settings.project_root.as_deref(), Some(root.as_path()));
            assert_eq!(settings.env_file, Some(root.join(".env")));
            assert_eq!(settings.container_name.as_deref(), Some("shop_stack"));
            assert_eq!(settings.server_port, 8081);
            assert_eq!(settings.container_workdir(&cwd).as_deref(), Some(expected));
        }
    }

    #[test]
    fn test_password_redacted_in_output() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load(dir.path(), &Overrides::default());
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("[REDACTED]"));
        assert!(!json.contains("\"password\""));
    }
}
