//! Container selection
//!
//! Picks at most one running container for a role suffix out of a registry
//! snapshot. When the project name is known only the exact
//! `<name><suffix>` container is eligible; otherwise any name ending with
//! the suffix is, and several matches are resolved by [`AmbiguityPolicy`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What to do when more than one running container ends with the suffix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AmbiguityPolicy {
    /// Refuse to pick and list the candidates
    #[default]
    Error,
    /// Take the first one in the order the runtime listed them
    First,
}

impl AmbiguityPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmbiguityPolicy::Error => "error",
            AmbiguityPolicy::First => "first",
        }
    }
}

#[derive(Debug, Error)]
pub enum SelectError {
    #[error(
        "{} running containers end with '{suffix}': {}; set CONTAINER_NAME or pass --on-ambiguous first",
        candidates.len(),
        candidates.join(", ")
    )]
    Ambiguous {
        suffix: String,
        candidates: Vec<String>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ContainerSelector {
    project: Option<String>,
    policy: AmbiguityPolicy,
}

impl ContainerSelector {
    pub fn new(project: Option<String>, policy: AmbiguityPolicy) -> Self {
        let project = project
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        Self { project, policy }
    }

    /// Describe what a container must be called to match, for messages
    pub fn pattern(&self, suffix: &str) -> String {
        match &self.project {
            Some(project) => format!("{}{}", project, suffix),
            None => format!("*{}", suffix),
        }
    }

    pub fn select<'a>(
        &self,
        suffix: &str,
        running: &'a [String],
    ) -> Result<Option<&'a str>, SelectError> {
        if let Some(project) = &self.project {
            let wanted = format!("{}{}", project, suffix);
            return Ok(running
                .iter()
                .map(String::as_str)
                .find(|name| *name == wanted));
        }

        let candidates: Vec<&str> = running
            .iter()
            .map(String::as_str)
            .filter(|name| name.ends_with(suffix))
            .collect();

        match candidates.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            [first, ..] => match self.policy {
                AmbiguityPolicy::First => {
                    tracing::debug!(
                        suffix,
                        count = candidates.len(),
                        chosen = %first,
                        "several containers match, taking the first"
                    );
                    Ok(Some(*first))
                }
                AmbiguityPolicy::Error => Err(SelectError::Ambiguous {
                    suffix: suffix.to_string(),
                    candidates: candidates.iter().map(|c| c.to_string()).collect(),
                }),
            },
        }
    }
}
