//! Rewrites of the generated Laravel `.env`

use regex_lite::{NoExpand, Regex};

/// One `KEY=value` assignment to enforce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvUpdate {
    pub key: &'static str,
    pub value: String,
}

impl EnvUpdate {
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

/// Point the app at the stack's MariaDB and its own host name
pub fn database_updates(project: &str, host: &str, db_port: u16, db_password: &str) -> Vec<EnvUpdate> {
    vec![
        EnvUpdate::new("APP_URL", format!("http://{}", host)),
        EnvUpdate::new("DB_CONNECTION", "mariadb"),
        EnvUpdate::new("DB_HOST", "mariadb"),
        EnvUpdate::new("DB_PORT", db_port.to_string()),
        EnvUpdate::new("DB_DATABASE", project),
        EnvUpdate::new("DB_USERNAME", "root"),
        EnvUpdate::new("DB_PASSWORD", db_password),
    ]
}

/// Apply updates to `.env` text. The first line assigning the key, commented
/// out or not, is replaced; missing keys are appended.
pub fn apply_updates(contents: &str, updates: &[EnvUpdate]) -> Result<String, regex_lite::Error> {
    let mut text = contents.to_string();
    for update in updates {
        let line = format!("{}={}", update.key, update.value);
        let pattern = format!(r"(?m)^[ \t]*(?:#[ \t]*)?{}[ \t]*=.*$", regex_lite::escape(update.key));
        let re = Regex::new(&pattern)?;

        if re.is_match(&text) {
            text = re.replace(&text, NoExpand(&line)).into_owned();
        } else {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&line);
            text.push('\n');
        }
    }
    Ok(text)
}
