//! # relay-settings
//!
//! Configuration for the hook relay, loaded from three layers (in priority
//! order):
//! 1. **Compiled defaults**: [`RelaySettings::default()`]
//! 2. **Settings file**: `~/.hook-relay/settings.json`, or the path in
//!    `HOOK_RELAY_SETTINGS` (deep-merged over defaults)
//! 3. **Environment variables**: `HOOK_RELAY_*` and `CLAUDE_PROJECT_DIR`
//!
//! The dispatcher never reads settings itself. The runner resolves them once
//! per process and hands the result to handlers.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _settings = RelaySettings::default();
        let _path = settings_path();
    }

    #[test]
    fn default_settings_are_valid() {
        let settings = RelaySettings::default();
        assert_eq!(settings.logging.level, "warn");
        assert!(settings.logging.file);
        assert!(settings.dispatch.handler_timeout_ms.is_none());
        assert_eq!(settings.dispatch.stdin_timeout_ms, 2000);
        assert!(settings.paths.project_dir.is_none());
        assert!(settings.notifications.webhook_url.is_none());
        assert_eq!(settings.notifications.webhook_timeout_ms, 3000);
    }
}
