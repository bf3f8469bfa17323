//! Input normalization.
//!
//! The host has used several field-naming conventions over time
//! (`tool_name` vs `toolName`, ...). [`FIELD_ALIASES`] lists every accepted
//! spelling per canonical field; it is consulted exactly once, here, so
//! handlers only ever see a [`HookEvent`].
//!
//! Normalization is total: empty input, malformed JSON, and non-object JSON
//! all produce [`HookEvent::default()`].

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Accepted spellings per canonical field, in preference order.
///
/// When several spellings are present, the first one with a non-null value
/// wins. snake_case comes first because it is what current hosts send.
pub const FIELD_ALIASES: &[(&str, &[&str])] = &[
    ("toolName", &["tool_name", "toolName"]),
    ("sessionId", &["session_id", "sessionId"]),
    ("toolInput", &["tool_input", "toolInput"]),
    (
        "toolResponse",
        &["tool_response", "toolResponse", "tool_result", "toolResult"],
    ),
    ("hookEventName", &["hook_event_name", "hookEventName"]),
    ("cwd", &["cwd"]),
    ("transcriptPath", &["transcript_path", "transcriptPath"]),
    ("subagentType", &["subagent_type", "subagentType"]),
    ("message", &["message"]),
    ("notificationType", &["notification_type", "notificationType"]),
    ("taskDescription", &["task_description", "taskDescription"]),
];

/// Canonical representation of one host event.
///
/// Built once per process and shared read-only by every handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookEvent {
    /// Tool that ran. Empty for non-tool events.
    pub tool_name: String,
    /// Host session identifier. Empty when the host did not send one.
    pub session_id: String,
    /// Tool arguments; shape depends on `tool_name`.
    pub tool_input: Value,
    /// Tool result, when the host includes it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_response: Option<Value>,
    /// Host-side event name (`PostToolUse`, `Stop`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_event_name: Option<String>,
    /// Host working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Path to the session transcript.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<String>,
    /// Subagent type (subagent-stop events).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subagent_type: Option<String>,
    /// Notification text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Notification kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_type: Option<String>,
    /// Task description (subagent events).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_description: Option<String>,
}

impl Default for HookEvent {
    fn default() -> Self {
        Self {
            tool_name: String::new(),
            session_id: String::new(),
            tool_input: Value::Object(Map::new()),
            tool_response: None,
            hook_event_name: None,
            cwd: None,
            transcript_path: None,
            subagent_type: None,
            message: None,
            notification_type: None,
            task_description: None,
        }
    }
}

impl HookEvent {
    /// Event for a tool call with empty input.
    #[must_use]
    pub fn for_tool(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            ..Self::default()
        }
    }

    /// String field of `tool_input`, if present.
    #[must_use]
    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.tool_input.get(key).and_then(Value::as_str)
    }

    /// Whether this is a tool event.
    #[must_use]
    pub fn is_tool_event(&self) -> bool {
        !self.tool_name.is_empty()
    }
}

/// Normalize raw stdin bytes.
pub fn normalize_bytes(raw: &[u8]) -> HookEvent {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return HookEvent::default();
    }
    match serde_json::from_slice::<Value>(raw) {
        Ok(value) => normalize_value(value),
        Err(e) => {
            debug!(error = %e, "hook input is not valid JSON, using defaults");
            HookEvent::default()
        }
    }
}

/// Normalize an already-parsed JSON value.
pub fn normalize_value(value: Value) -> HookEvent {
    let Value::Object(raw) = value else {
        debug!("hook input is not a JSON object, using defaults");
        return HookEvent::default();
    };
    let mut fields = canonicalize(raw);

    let mut take_str = |key: &str| match fields.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    };

    let tool_name = take_str("toolName").unwrap_or_default();
    let session_id = take_str("sessionId").unwrap_or_default();
    let hook_event_name = take_str("hookEventName");
    let cwd = take_str("cwd");
    let transcript_path = take_str("transcriptPath");
    let subagent_type = take_str("subagentType");
    let message = take_str("message");
    let notification_type = take_str("notificationType");
    let task_description = take_str("taskDescription");

    HookEvent {
        tool_name,
        session_id,
        tool_input: fields
            .remove("toolInput")
            .unwrap_or_else(|| Value::Object(Map::new())),
        tool_response: fields.remove("toolResponse"),
        hook_event_name,
        cwd,
        transcript_path,
        subagent_type,
        message,
        notification_type,
        task_description,
    }
}

/// Map every aliased key onto its canonical name.
fn canonicalize(mut raw: Map<String, Value>) -> Map<String, Value> {
    let mut canonical = Map::new();
    for (name, aliases) in FIELD_ALIASES {
        let chosen = aliases
            .iter()
            .find_map(|alias| raw.remove(*alias).filter(|v| !v.is_null()));
        if let Some(value) = chosen {
            let _ = canonical.insert((*name).to_string(), value);
        }
    }
    canonical
}
