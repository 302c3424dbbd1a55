//! Container roles - which service of the dev stack a tool belongs to

use serde::{Deserialize, Serialize};

/// Tools that `devtool run` knows how to route
pub const KNOWN_TOOLS: [&str; 5] = ["php", "composer", "npm", "npx", "node"];

/// Logical service a container belongs to, identified by its name suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// PHP-FPM container (`php`, `composer`)
    Php,
    /// Node.js container (`node`, `npm`, `npx`)
    Node,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Php, Role::Node];

    /// Suffix the compose stack appends to `CONTAINER_NAME` for this role
    pub fn default_suffix(&self) -> &'static str {
        match self {
            Role::Php => "_php",
            Role::Node => "_node",
        }
    }

    /// Tools served by this role's container
    pub fn tools(&self) -> &'static [&'static str] {
        match self {
            Role::Php => &["php", "composer"],
            Role::Node => &["node", "npm", "npx"],
        }
    }

    /// Look up the role that owns a known tool
    pub fn for_tool(tool: &str) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|role| role.tools().contains(&tool))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Php => "php",
            Role::Node => "node",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name suffixes per role. Comes from static configuration, never from
/// user arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSuffixes {
    pub php: String,
    pub node: String,
}

impl RoleSuffixes {
    pub fn suffix(&self, role: Role) -> &str {
        match role {
            Role::Php => &self.php,
            Role::Node => &self.node,
        }
    }
}

impl Default for RoleSuffixes {
    fn default() -> Self {
        Self {
            php: Role::Php.default_suffix().to_string(),
            node: Role::Node.default_suffix().to_string(),
        }
    }
}
