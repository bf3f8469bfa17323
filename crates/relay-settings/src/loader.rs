//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`RelaySettings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Drop file values outside their accepted ranges
//! 4. Apply environment variable overrides (highest priority)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::RelaySettings;

/// Accepted `handlerTimeoutMs` range.
pub const HANDLER_TIMEOUT_RANGE_MS: (u64, u64) = (1, 600_000);

/// Accepted `stdinTimeoutMs` range.
pub const STDIN_TIMEOUT_RANGE_MS: (u64, u64) = (0, 60_000);

/// Env var naming an explicit settings file.
pub const SETTINGS_PATH_ENV: &str = "HOOK_RELAY_SETTINGS";

/// Resolve the settings file path.
///
/// `HOOK_RELAY_SETTINGS` if set, else `~/.hook-relay/settings.json`.
pub fn settings_path() -> PathBuf {
    if let Some(path) = read_env_string(SETTINGS_PATH_ENV) {
        return PathBuf::from(path);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".hook-relay").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<RelaySettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<RelaySettings> {
    let defaults = serde_json::to_value(RelaySettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: RelaySettings = serde_json::from_value(merged)?;
    check_ranges(&mut settings);
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Drop file values outside the accepted ranges.
///
/// An out-of-range handler timeout becomes unbounded; an out-of-range
/// stdin timeout reverts to the default.
fn check_ranges(settings: &mut RelaySettings) {
    let (min, max) = HANDLER_TIMEOUT_RANGE_MS;
    if let Some(ms) = settings.dispatch.handler_timeout_ms.filter(|ms| !(min..=max).contains(ms)) {
        warn!(value = ms, min, max, "dispatch.handlerTimeoutMs out of range, ignoring");
        settings.dispatch.handler_timeout_ms = None;
    }

    let (min, max) = STDIN_TIMEOUT_RANGE_MS;
    let ms = settings.dispatch.stdin_timeout_ms;
    if !(min..=max).contains(&ms) {
        warn!(value = ms, min, max, "dispatch.stdinTimeoutMs out of range, ignoring");
        settings.dispatch.stdin_timeout_ms = RelaySettings::default().dispatch.stdin_timeout_ms;
    }
}

/// Apply process environment overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut RelaySettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
///
/// Empty values are ignored. Numbers must parse and fall within range;
/// invalid values are logged and ignored.
pub fn apply_overrides_from<F>(settings: &mut RelaySettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let string = |name: &str| lookup(name).filter(|v| !v.is_empty());
    let number = |name: &str, min: u64, max: u64| {
        let val = string(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid numeric env var, ignoring");
        }
        result
    };

    if let Some(v) = string("HOOK_RELAY_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = string("HOOK_RELAY_LOG_DIR") {
        settings.logging.dir = Some(v);
    }
    let (min, max) = HANDLER_TIMEOUT_RANGE_MS;
    if let Some(v) = number("HOOK_RELAY_HANDLER_TIMEOUT_MS", min, max) {
        settings.dispatch.handler_timeout_ms = Some(v);
    }
    let (min, max) = STDIN_TIMEOUT_RANGE_MS;
    if let Some(v) = number("HOOK_RELAY_STDIN_TIMEOUT_MS", min, max) {
        settings.dispatch.stdin_timeout_ms = v;
    }
    if let Some(v) = string("CLAUDE_PROJECT_DIR") {
        settings.paths.project_dir = Some(v);
    }
    if let Some(v) = string("HOOK_RELAY_STATE_DIR") {
        settings.paths.state_dir = Some(v);
    }
    if let Some(v) = string("HOOK_RELAY_WEBHOOK_URL") {
        settings.notifications.webhook_url = Some(v);
    }
}

/// Parse a string as a `u64` within an inclusive range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
