//! Core types for hook dispatch.
//!
//! Defines hook categories, the response envelope written to the host,
//! the partial output a handler may return, and per-handler outcomes.
//! Wire types use camelCase field names to match the host's JSON contract.

use serde::{Deserialize, Serialize};

/// The envelope written when nothing else can be: always valid, always `continue`.
pub const FALLBACK_ENVELOPE_JSON: &str = r#"{"continue":true,"suppressOutput":true}"#;

/// Lifecycle moment a group of hooks responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookCategory {
    /// After a tool has run. The only category with per-tool matching.
    PostToolUse,
    /// When a session starts or resumes.
    SessionStart,
    /// When the main agent stops.
    Stop,
    /// When a subagent stops.
    SubagentStop,
    /// Host notification (permission prompt, idle, ...).
    Notification,
    /// Plugin setup.
    Setup,
}

impl HookCategory {
    /// Returns all categories.
    #[must_use]
    pub fn all() -> &'static [HookCategory] {
        &[
            Self::PostToolUse,
            Self::SessionStart,
            Self::Stop,
            Self::SubagentStop,
            Self::Notification,
            Self::Setup,
        ]
    }

    /// Canonical kebab-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PostToolUse => "post-tool-use",
            Self::SessionStart => "session-start",
            Self::Stop => "stop",
            Self::SubagentStop => "subagent-stop",
            Self::Notification => "notification",
            Self::Setup => "setup",
        }
    }

    /// Prefix used in hook identifiers (`<prefix>/<name>`).
    #[must_use]
    pub fn route_prefix(self) -> &'static str {
        match self {
            Self::PostToolUse => "posttool",
            Self::SessionStart => "lifecycle",
            Self::Stop => "stop",
            Self::SubagentStop => "subagent-stop",
            Self::Notification => "notification",
            Self::Setup => "setup",
        }
    }

    /// Resolve a hook identifier prefix. Accepts the route prefix or the
    /// canonical name.
    #[must_use]
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.route_prefix() == prefix || c.as_str() == prefix)
    }

    /// Event name the host expects inside `hookSpecificOutput`.
    #[must_use]
    pub fn hook_event_name(self) -> &'static str {
        match self {
            Self::PostToolUse => "PostToolUse",
            Self::SessionStart => "SessionStart",
            Self::Stop => "Stop",
            Self::SubagentStop => "SubagentStop",
            Self::Notification => "Notification",
            Self::Setup => "Setup",
        }
    }

    /// Whether handlers declare per-tool applicability in this category.
    /// Elsewhere every registered handler runs.
    #[must_use]
    pub fn has_tool_matching(self) -> bool {
        matches!(self, Self::PostToolUse)
    }

    /// Whether handler messages are passed through to the host.
    #[must_use]
    pub fn surfaces_output(self) -> bool {
        matches!(self, Self::SessionStart | Self::Setup)
    }
}

impl std::fmt::Display for HookCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The JSON object written to stdout for the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    /// Always `true`: the relay never tells the host to abort.
    #[serde(rename = "continue")]
    pub continue_: bool,
    /// `true` when nothing should be shown to the user.
    pub suppress_output: bool,
    /// Human-readable message surfaced to the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
    /// Structured side-channel data for specific categories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_specific_output: Option<serde_json::Value>,
}

impl ResponseEnvelope {
    /// The default silent-success envelope.
    #[must_use]
    pub fn silent() -> Self {
        Self {
            continue_: true,
            suppress_output: true,
            system_message: None,
            hook_specific_output: None,
        }
    }

    /// Serialize to one JSON line, falling back to [`FALLBACK_ENVELOPE_JSON`].
    #[must_use]
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| FALLBACK_ENVELOPE_JSON.to_string())
    }
}

impl Default for ResponseEnvelope {
    fn default() -> Self {
        Self::silent()
    }
}

/// Partial envelope returned by a handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookOutput {
    /// Message for the user.
    pub system_message: Option<String>,
    /// Structured data merged into `hookSpecificOutput`.
    pub hook_specific_output: Option<serde_json::Value>,
}

impl HookOutput {
    /// No output; the common case for side-effect-only handlers.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Output carrying a user-facing message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            system_message: Some(message.into()),
            hook_specific_output: None,
        }
    }

    /// Output carrying structured hook-specific data.
    #[must_use]
    pub fn specific(value: serde_json::Value) -> Self {
        Self {
            system_message: None,
            hook_specific_output: Some(value),
        }
    }

    /// Whether this output carries nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.system_message.is_none() && self.hook_specific_output.is_none()
    }
}

/// Result of running one handler during a dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    /// Handler name.
    pub handler_name: String,
    /// Whether the handler completed without error.
    pub succeeded: bool,
    /// Error message, present iff the handler failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl DispatchOutcome {
    /// A successful outcome.
    #[must_use]
    pub fn success(name: impl Into<String>) -> Self {
        Self {
            handler_name: name.into(),
            succeeded: true,
            error_message: None,
        }
    }

    /// A failed outcome.
    #[must_use]
    pub fn failure(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            handler_name: name.into(),
            succeeded: false,
            error_message: Some(message.into()),
        }
    }
}

/// Registered hook description (for listing).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookInfo {
    /// Handler name.
    pub name: String,
    /// Category the handler belongs to.
    pub category: HookCategory,
    /// Applicability, rendered (`*`, `Bash`, `Write|Edit`, `mcp__*`).
    pub match_spec: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
