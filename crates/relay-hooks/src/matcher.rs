//! Handler applicability.
//!
//! A handler declares which tool events it cares about with a [`MatchSpec`].
//! Matching is a pure, total predicate on the event's tool name.

use std::fmt;

use crate::event::HookEvent;

/// Tool-name prefix the host uses for MCP server tools (`mcp__<server>__<tool>`).
pub const MCP_PREFIX: &str = "mcp__";

/// Which tool events a handler applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSpec {
    /// Every event.
    Any,
    /// Exactly one tool name.
    Tool(&'static str),
    /// Any of a fixed set of tool names.
    Tools(&'static [&'static str]),
    /// Any MCP tool.
    McpPrefix,
}

impl MatchSpec {
    /// Whether a tool name satisfies this spec.
    #[must_use]
    pub fn matches_tool(self, tool_name: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Tool(name) => tool_name == name,
            Self::Tools(names) => names.contains(&tool_name),
            Self::McpPrefix => tool_name.starts_with(MCP_PREFIX),
        }
    }
}

impl fmt::Display for MatchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Tool(name) => f.write_str(name),
            Self::Tools(names) => f.write_str(&names.join("|")),
            Self::McpPrefix => write!(f, "{MCP_PREFIX}*"),
        }
    }
}

/// Whether `spec` applies to `event`.
#[must_use]
pub fn matches(event: &HookEvent, spec: MatchSpec) -> bool {
    spec.matches_tool(&event.tool_name)
}
