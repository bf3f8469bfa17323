//! Settings type definitions.
//!
//! All types use camelCase field names and `#[serde(default)]`, so a settings
//! file only needs the keys it overrides.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// ```json
/// {
///   "logging": { "level": "debug" },
///   "dispatch": { "handlerTimeoutMs": 5000 }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelaySettings {
    /// Side-channel logging.
    pub logging: LoggingSettings,
    /// Dispatcher behavior.
    pub dispatch: DispatchSettings,
    /// Project and state locations.
    pub paths: PathSettings,
    /// Notification forwarding.
    pub notifications: NotificationSettings,
}

impl RelaySettings {
    /// Project root: the configured directory, else the current directory.
    pub fn project_dir(&self) -> PathBuf {
        self.paths.project_dir.as_ref().map_or_else(
            || std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            PathBuf::from,
        )
    }

    /// Directory for handler state (coordination files, counters).
    pub fn state_dir(&self) -> PathBuf {
        self.paths.state_dir.as_ref().map_or_else(
            || self.project_dir().join(".claude").join("hook-state"),
            PathBuf::from,
        )
    }

    /// Directory for the side-channel log and handler JSONL logs.
    pub fn log_dir(&self) -> PathBuf {
        self.logging.dir.as_ref().map_or_else(
            || self.project_dir().join(".claude").join("logs"),
            PathBuf::from,
        )
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level for the side-channel log (`RUST_LOG` wins).
    pub level: String,
    /// Log directory. Defaults to `<project>/.claude/logs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// Whether to write `hooks.log` at all.
    pub file: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            dir: None,
            file: true,
        }
    }
}

/// Dispatcher configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DispatchSettings {
    /// Per-handler timeout. `None` lets a slow handler delay the whole dispatch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler_timeout_ms: Option<u64>,
    /// How long to wait for the host to close stdin before treating it as empty.
    pub stdin_timeout_ms: u64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            handler_timeout_ms: None,
            stdin_timeout_ms: 2000,
        }
    }
}

/// Filesystem locations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PathSettings {
    /// Project root. Usually supplied by the host through `CLAUDE_PROJECT_DIR`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_dir: Option<String>,
    /// State directory. Defaults to `<project>/.claude/hook-state`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<String>,
}

/// Notification forwarding configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    /// Webhook that receives notification events. Forwarding is off when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    /// Request timeout for the webhook.
    pub webhook_timeout_ms: u64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            webhook_url: None,
            webhook_timeout_ms: 3000,
        }
    }
}
