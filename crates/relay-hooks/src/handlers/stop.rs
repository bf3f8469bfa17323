//! Stop and subagent-stop handlers.

use async_trait::async_trait;
use relay_core::Result;
use serde_json::{Map, Value, json};

use super::post_tool::{FileChangeTracker, ToolMetrics};
use super::session::instance_file;
use super::store;
use crate::env::HookEnv;
use crate::event::HookEvent;
use crate::handler::HookHandler;
use crate::types::HookOutput;

/// Removes this session's coordination file.
pub struct InstanceRelease;

#[async_trait]
impl HookHandler for InstanceRelease {
    fn name(&self) -> &str {
        "instance-release"
    }

    fn description(&self) -> Option<&str> {
        Some("Unregister this session")
    }

    async fn handle(&self, event: &HookEvent, env: &HookEnv) -> Result<HookOutput> {
        match tokio::fs::remove_file(instance_file(env, &event.session_id)).await {
            Ok(()) => Ok(HookOutput::none()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HookOutput::none()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Appends a per-session summary to `sessions.jsonl`.
pub struct SessionSummary;

#[async_trait]
impl HookHandler for SessionSummary {
    fn name(&self) -> &str {
        "session-summary"
    }

    fn description(&self) -> Option<&str> {
        Some("Summarize tool usage and changed files")
    }

    async fn handle(&self, event: &HookEvent, env: &HookEnv) -> Result<HookOutput> {
        let counts = store::read_json(&ToolMetrics::path(env, &event.session_id))
            .await?
            .and_then(|doc| doc.get("counts").cloned())
            .and_then(|c| match c {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_else(Map::new);
        let total: u64 = counts.values().filter_map(Value::as_u64).sum();
        let files = FileChangeTracker::changed_files(env, &event.session_id).await?;

        let record = json!({
            "timestamp": store::timestamp(),
            "sessionId": event.session_id,
            "toolCalls": total,
            "tools": counts,
            "filesChanged": files.len(),
            "files": files,
        });
        store::append_jsonl(&env.log_file("sessions.jsonl"), &record).await?;
        Ok(HookOutput::none())
    }
}

/// Records finished subagents in `subagents.jsonl`.
pub struct SubagentLog;

#[async_trait]
impl HookHandler for SubagentLog {
    fn name(&self) -> &str {
        "subagent-log"
    }

    fn description(&self) -> Option<&str> {
        Some("Record finished subagents")
    }

    async fn handle(&self, event: &HookEvent, env: &HookEnv) -> Result<HookOutput> {
        let record = json!({
            "timestamp": store::timestamp(),
            "sessionId": event.session_id,
            "subagentType": event.subagent_type,
            "taskDescription": event.task_description,
        });
        store::append_jsonl(&env.log_file("subagents.jsonl"), &record).await?;
        Ok(HookOutput::none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::normalize_value;
    use crate::handlers::session::InstanceRegister;

    fn session(id: &str) -> HookEvent {
        HookEvent {
            session_id: id.to_string(),
            ..HookEvent::default()
        }
    }

    #[tokio::test]
    async fn release_removes_registration() {
        let tmp = tempfile::tempdir().unwrap();
        let env = HookEnv::rooted(tmp.path());
        let _ = InstanceRegister.handle(&session("s1"), &env).await.unwrap();
        assert!(instance_file(&env, "s1").exists());

        let _ = InstanceRelease.handle(&session("s1"), &env).await.unwrap();
        assert!(!instance_file(&env, "s1").exists());
    }

    #[tokio::test]
    async fn release_without_registration_is_ok() {
        let tmp = tempfile::tempdir().unwrap();
        let env = HookEnv::rooted(tmp.path());
        assert!(InstanceRelease.handle(&session("ghost"), &env).await.is_ok());
    }

    #[tokio::test]
    async fn summary_combines_metrics_and_changes() {
        let tmp = tempfile::tempdir().unwrap();
        let env = HookEnv::rooted(tmp.path());
        for tool in ["Read", "Read", "Write"] {
            let event = normalize_value(json!({
                "tool_name": tool,
                "session_id": "s1",
                "tool_input": {"file_path": "/src/lib.rs"}
            }));
            let _ = ToolMetrics.handle(&event, &env).await.unwrap();
            if tool == "Write" {
                let _ = FileChangeTracker.handle(&event, &env).await.unwrap();
            }
        }

        let _ = SessionSummary.handle(&session("s1"), &env).await.unwrap();
        let content = std::fs::read_to_string(env.log_file("sessions.jsonl")).unwrap();
        let record: Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(record["toolCalls"], 3);
        assert_eq!(record["tools"]["Read"], 2);
        assert_eq!(record["filesChanged"], 1);
        assert_eq!(record["files"][0], "/src/lib.rs");
    }

    #[tokio::test]
    async fn summary_of_empty_session() {
        let tmp = tempfile::tempdir().unwrap();
        let env = HookEnv::rooted(tmp.path());
        let _ = SessionSummary.handle(&session("new"), &env).await.unwrap();
        let content = std::fs::read_to_string(env.log_file("sessions.jsonl")).unwrap();
        let record: Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(record["toolCalls"], 0);
        assert_eq!(record["filesChanged"], 0);
    }

    #[tokio::test]
    async fn subagent_log_records_type() {
        let tmp = tempfile::tempdir().unwrap();
        let env = HookEnv::rooted(tmp.path());
        let event = normalize_value(json!({
            "session_id": "s1",
            "subagent_type": "code-reviewer"
        }));
        let _ = SubagentLog.handle(&event, &env).await.unwrap();
        let content = std::fs::read_to_string(env.log_file("subagents.jsonl")).unwrap();
        let record: Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(record["subagentType"], "code-reviewer");
        assert!(record["taskDescription"].is_null());
    }
}
