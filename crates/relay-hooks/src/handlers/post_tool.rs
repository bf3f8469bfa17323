//! Post-tool-use handlers.
//!
//! Each runs after a tool call and records something about it. All of them
//! are side-effect-only.

use async_trait::async_trait;
use relay_core::{RelayError, Result};
use serde_json::{Value, json};
use tokio::io::AsyncWriteExt;

use super::store;
use crate::env::HookEnv;
use crate::event::HookEvent;
use crate::handler::HookHandler;
use crate::matcher::{MCP_PREFIX, MatchSpec};
use crate::types::HookOutput;

/// Tools that modify files on disk.
pub const FILE_EDIT_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit", "NotebookEdit"];

const MAX_COMMAND_CHARS: usize = 200;

/// Short description of what a tool call touched.
fn target_summary(event: &HookEvent) -> Option<String> {
    if let Some(path) = event
        .input_str("file_path")
        .or_else(|| event.input_str("notebook_path"))
    {
        return Some(path.to_string());
    }
    if let Some(command) = event.input_str("command") {
        return Some(store::truncate(command, MAX_COMMAND_CHARS));
    }
    event
        .input_str("pattern")
        .or_else(|| event.input_str("url"))
        .or_else(|| event.input_str("query"))
        .map(ToString::to_string)
}

/// Appends one line per tool call to `audit.jsonl`.
pub struct AuditLog;

#[async_trait]
impl HookHandler for AuditLog {
    fn name(&self) -> &str {
        "audit-log"
    }

    fn description(&self) -> Option<&str> {
        Some("Record every tool call")
    }

    async fn handle(&self, event: &HookEvent, env: &HookEnv) -> Result<HookOutput> {
        let record = json!({
            "timestamp": store::timestamp(),
            "sessionId": event.session_id,
            "tool": event.tool_name,
            "target": target_summary(event),
        });
        store::append_jsonl(&env.log_file("audit.jsonl"), &record).await?;
        Ok(HookOutput::none())
    }
}

/// Per-session tool usage counters in `metrics/<session>.json`.
pub struct ToolMetrics;

impl ToolMetrics {
    /// Counter document for a session.
    pub fn path(env: &HookEnv, session_id: &str) -> std::path::PathBuf {
        store::session_file(&env.state_dir.join("metrics"), session_id, "json")
    }
}

#[async_trait]
impl HookHandler for ToolMetrics {
    fn name(&self) -> &str {
        "tool-metrics"
    }

    fn description(&self) -> Option<&str> {
        Some("Count tool calls per session")
    }

    async fn handle(&self, event: &HookEvent, env: &HookEnv) -> Result<HookOutput> {
        let key = if event.tool_name.is_empty() {
            "unknown"
        } else {
            event.tool_name.as_str()
        };
        let _ = store::increment_counter(&Self::path(env, &event.session_id), key).await?;
        Ok(HookOutput::none())
    }
}

/// Shell command history in `bash-history.jsonl`.
pub struct BashHistory;

#[async_trait]
impl HookHandler for BashHistory {
    fn name(&self) -> &str {
        "bash-history"
    }

    fn match_spec(&self) -> MatchSpec {
        MatchSpec::Tool("Bash")
    }

    fn description(&self) -> Option<&str> {
        Some("Keep a history of shell commands")
    }

    async fn handle(&self, event: &HookEvent, env: &HookEnv) -> Result<HookOutput> {
        let command = event
            .input_str("command")
            .ok_or_else(|| RelayError::handler(self.name(), "Bash event without a command"))?;
        let exit_code = event
            .tool_response
            .as_ref()
            .and_then(|r| r.get("exit_code").or_else(|| r.get("exitCode")))
            .and_then(Value::as_i64);
        let record = json!({
            "timestamp": store::timestamp(),
            "sessionId": event.session_id,
            "command": command,
            "description": event.input_str("description"),
            "exitCode": exit_code,
        });
        store::append_jsonl(&env.log_file("bash-history.jsonl"), &record).await?;
        Ok(HookOutput::none())
    }
}

/// Files changed in a session, one path per line in `changed-files/<session>.txt`.
pub struct FileChangeTracker;

impl FileChangeTracker {
    /// Change list for a session.
    pub fn path(env: &HookEnv, session_id: &str) -> std::path::PathBuf {
        store::session_file(&env.state_dir.join("changed-files"), session_id, "txt")
    }

    /// Paths recorded for a session, in first-change order.
    pub async fn changed_files(env: &HookEnv, session_id: &str) -> Result<Vec<String>> {
        match tokio::fs::read_to_string(Self::path(env, session_id)).await {
            Ok(content) => Ok(content
                .lines()
                .filter(|l| !l.is_empty())
                .map(ToString::to_string)
                .collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl HookHandler for FileChangeTracker {
    fn name(&self) -> &str {
        "file-change-tracker"
    }

    fn match_spec(&self) -> MatchSpec {
        MatchSpec::Tools(FILE_EDIT_TOOLS)
    }

    fn description(&self) -> Option<&str> {
        Some("Track files modified in this session")
    }

    async fn handle(&self, event: &HookEvent, env: &HookEnv) -> Result<HookOutput> {
        let path = event
            .input_str("file_path")
            .or_else(|| event.input_str("notebook_path"))
            .ok_or_else(|| {
                RelayError::handler(
                    self.name(),
                    format!("{} event without a file path", event.tool_name),
                )
            })?;

        let known = Self::changed_files(env, &event.session_id).await?;
        if known.iter().any(|p| p == path) {
            return Ok(HookOutput::none());
        }

        let target = Self::path(env, &event.session_id);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&target)
            .await?;
        file.write_all(format!("{path}\n").as_bytes()).await?;
        file.flush().await?;
        Ok(HookOutput::none())
    }
}

/// Subagent launches in `subagent-tasks.jsonl`.
pub struct TaskTracker;

#[async_trait]
impl HookHandler for TaskTracker {
    fn name(&self) -> &str {
        "task-tracker"
    }

    fn match_spec(&self) -> MatchSpec {
        MatchSpec::Tool("Task")
    }

    fn description(&self) -> Option<&str> {
        Some("Record delegated subagent tasks")
    }

    async fn handle(&self, event: &HookEvent, env: &HookEnv) -> Result<HookOutput> {
        let record = json!({
            "timestamp": store::timestamp(),
            "sessionId": event.session_id,
            "subagentType": event.input_str("subagent_type"),
            "description": event.input_str("description"),
        });
        store::append_jsonl(&env.log_file("subagent-tasks.jsonl"), &record).await?;
        Ok(HookOutput::none())
    }
}

/// Skill invocation counters in `skill-usage.json`.
pub struct SkillUsage;

impl SkillUsage {
    /// Counter document shared by all sessions.
    pub fn path(env: &HookEnv) -> std::path::PathBuf {
        env.state_dir.join("skill-usage.json")
    }
}

#[async_trait]
impl HookHandler for SkillUsage {
    fn name(&self) -> &str {
        "skill-usage"
    }

    fn match_spec(&self) -> MatchSpec {
        MatchSpec::Tool("Skill")
    }

    fn description(&self) -> Option<&str> {
        Some("Count skill invocations")
    }

    async fn handle(&self, event: &HookEvent, env: &HookEnv) -> Result<HookOutput> {
        let skill = event
            .input_str("skill")
            .or_else(|| event.input_str("command"))
            .ok_or_else(|| RelayError::handler(self.name(), "Skill event without a skill name"))?;
        let _ = store::increment_counter(&Self::path(env), skill).await?;
        Ok(HookOutput::none())
    }
}

/// MCP tool calls in `mcp-calls.jsonl`, split into server and tool.
pub struct McpCallLog;

/// Split `mcp__<server>__<tool>` into its parts.
pub fn split_mcp_name(tool_name: &str) -> Option<(&str, &str)> {
    tool_name.strip_prefix(MCP_PREFIX)?.split_once("__")
}

#[async_trait]
impl HookHandler for McpCallLog {
    fn name(&self) -> &str {
        "mcp-call-log"
    }

    fn match_spec(&self) -> MatchSpec {
        MatchSpec::McpPrefix
    }

    fn description(&self) -> Option<&str> {
        Some("Record MCP server tool calls")
    }

    async fn handle(&self, event: &HookEvent, env: &HookEnv) -> Result<HookOutput> {
        let (server, tool) = split_mcp_name(&event.tool_name)
            .map_or((None, None), |(s, t)| (Some(s), Some(t)));
        let record = json!({
            "timestamp": store::timestamp(),
            "sessionId": event.session_id,
            "server": server,
            "tool": tool,
            "fullName": event.tool_name,
        });
        store::append_jsonl(&env.log_file("mcp-calls.jsonl"), &record).await?;
        Ok(HookOutput::none())
    }
}
