//! Session-start handlers: instance coordination and context injection.

use std::path::PathBuf;

use async_trait::async_trait;
use relay_core::Result;
use serde_json::json;
use tracing::debug;

use super::store;
use crate::env::HookEnv;
use crate::event::HookEvent;
use crate::handler::HookHandler;
use crate::types::HookOutput;

/// Upper bound on injected context.
pub const MAX_CONTEXT_CHARS: usize = 10_000;

/// Directory of per-session coordination files.
pub fn instances_dir(env: &HookEnv) -> PathBuf {
    env.state_dir.join("instances")
}

/// Coordination file for one session.
pub fn instance_file(env: &HookEnv, session_id: &str) -> PathBuf {
    store::session_file(&instances_dir(env), session_id, "json")
}

/// Writes `instances/<session>.json` and reports other live sessions.
pub struct InstanceRegister;

async fn count_other_instances(env: &HookEnv, own: &std::path::Path) -> Result<usize> {
    let mut entries = match tokio::fs::read_dir(instances_dir(env)).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };
    let mut count = 0;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path != own && path.extension().is_some_and(|ext| ext == "json") {
            count += 1;
        }
    }
    Ok(count)
}

#[async_trait]
impl HookHandler for InstanceRegister {
    fn name(&self) -> &str {
        "instance-register"
    }

    fn description(&self) -> Option<&str> {
        Some("Register this session for multi-instance coordination")
    }

    async fn handle(&self, event: &HookEvent, env: &HookEnv) -> Result<HookOutput> {
        let own = instance_file(env, &event.session_id);
        let record = json!({
            "sessionId": event.session_id,
            "pid": std::process::id(),
            "cwd": event.cwd.clone().unwrap_or_else(|| env.project_dir.display().to_string()),
            "startedAt": store::timestamp(),
        });
        store::write_json(&own, &record).await?;

        let others = count_other_instances(env, &own).await?;
        debug!(others, "Registered session instance");
        if others == 0 {
            return Ok(HookOutput::none());
        }
        let noun = if others == 1 { "instance" } else { "instances" };
        Ok(HookOutput::message(format!(
            "{others} other Claude {noun} active in this project"
        )))
    }
}

/// Surfaces staged session context as `additionalContext`.
pub struct ContextLoader;

impl ContextLoader {
    /// Where the previous session stages its context.
    pub fn path(env: &HookEnv) -> PathBuf {
        env.project_dir
            .join(".claude")
            .join("context")
            .join("session-context.md")
    }
}

#[async_trait]
impl HookHandler for ContextLoader {
    fn name(&self) -> &str {
        "context-loader"
    }

    fn description(&self) -> Option<&str> {
        Some("Load persisted context from the previous session")
    }

    async fn handle(&self, _event: &HookEvent, env: &HookEnv) -> Result<HookOutput> {
        let content = match tokio::fs::read_to_string(Self::path(env)).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HookOutput::none()),
            Err(e) => return Err(e.into()),
        };
        let content = content.trim();
        if content.is_empty() {
            return Ok(HookOutput::none());
        }
        Ok(HookOutput::specific(json!({
            "additionalContext": store::truncate(content, MAX_CONTEXT_CHARS),
        })))
    }
}
