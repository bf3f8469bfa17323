//! Environment handed to handlers.
//!
//! The dispatcher never touches the process environment. The runner resolves
//! settings into a [`HookEnv`] and every handler does its I/O relative to it.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Locations and endpoints available to handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookEnv {
    /// Project root.
    pub project_dir: PathBuf,
    /// Handler state (coordination files, counters).
    pub state_dir: PathBuf,
    /// Handler JSONL logs.
    pub log_dir: PathBuf,
    /// Notification webhook, if configured.
    pub webhook_url: Option<String>,
    /// Webhook request timeout.
    pub webhook_timeout: Duration,
}

impl HookEnv {
    /// Explicit locations.
    #[must_use]
    pub fn new(project_dir: PathBuf, state_dir: PathBuf, log_dir: PathBuf) -> Self {
        Self {
            project_dir,
            state_dir,
            log_dir,
            webhook_url: None,
            webhook_timeout: Duration::from_secs(3),
        }
    }

    /// Default layout under a project root: `.claude/hook-state` and `.claude/logs`.
    #[must_use]
    pub fn rooted(project_dir: impl AsRef<Path>) -> Self {
        let project_dir = project_dir.as_ref().to_path_buf();
        let claude = project_dir.join(".claude");
        Self::new(
            project_dir,
            claude.join("hook-state"),
            claude.join("logs"),
        )
    }

    /// Set the notification webhook.
    #[must_use]
    pub fn with_webhook(mut self, url: impl Into<String>, timeout: Duration) -> Self {
        self.webhook_url = Some(url.into());
        self.webhook_timeout = timeout;
        self
    }

    /// Path of a JSONL log under the log directory.
    #[must_use]
    pub fn log_file(&self, name: &str) -> PathBuf {
        self.log_dir.join(name)
    }
}
