//! Dispatch requests and the invocations built from them

use thiserror::Error;

use super::role::{Role, KNOWN_TOOLS};

/// `run` was given a tool that has no role
#[derive(Debug, Error)]
#[error("unknown tool '{tool}' (known: {}); use `devtool exec --role <php|node> {tool}` for other tools", KNOWN_TOOLS.join(", "))]
pub struct UnknownTool {
    pub tool: String,
}

/// One tool call to resolve and execute. Built per invocation, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub tool: String,
    /// Forwarded verbatim, in order
    pub args: Vec<String>,
    pub role: Role,
}

impl DispatchRequest {
    pub fn new(tool: impl Into<String>, args: Vec<String>, role: Role) -> Self {
        Self {
            tool: tool.into(),
            args,
            role,
        }
    }

    /// Build a request for one of the known tools, deriving its role
    pub fn for_known_tool(tool: &str, args: Vec<String>) -> Result<Self, UnknownTool> {
        let role = Role::for_tool(tool).ok_or_else(|| UnknownTool {
            tool: tool.to_string(),
        })?;
        Ok(Self::new(tool, args, role))
    }

    /// Split `[tool, args...]` as collected from the command line
    pub fn from_argv(mut argv: Vec<String>) -> Result<Self, UnknownTool> {
        if argv.is_empty() {
            return Err(UnknownTool {
                tool: String::new(),
            });
        }
        let tool = argv.remove(0);
        Self::for_known_tool(&tool, argv)
    }
}

/// What an executor actually runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub tool: String,
    pub args: Vec<String>,
    /// Working directory inside the container; ignored on the host
    pub workdir: Option<String>,
}

impl Invocation {
    pub fn new(tool: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            tool: tool.into(),
            args,
            workdir: None,
        }
    }

    pub fn with_workdir(mut self, workdir: Option<String>) -> Self {
        self.workdir = workdir;
        self
    }

    /// Human-readable form for logs. Not shell-safe.
    pub fn display(&self) -> String {
        std::iter::once(self.tool.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<&DispatchRequest> for Invocation {
    fn from(request: &DispatchRequest) -> Self {
        Invocation::new(request.tool.clone(), request.args.clone())
    }
}
