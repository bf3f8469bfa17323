//! End-to-end dispatch behavior: matching, failure isolation, concurrency,
//! routing, and the built-in handlers against a temporary project.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use relay_core::logging::capture_logs;
use relay_core::{RelayError, Result};
use relay_hooks::dispatcher::{DispatchOptions, dispatch};
use relay_hooks::env::HookEnv;
use relay_hooks::event::{HookEvent, normalize_bytes, normalize_value};
use relay_hooks::handler::HookHandler;
use relay_hooks::matcher::MatchSpec;
use relay_hooks::registry::HookBundle;
use relay_hooks::router::Router;
use relay_hooks::types::{FALLBACK_ENVELOPE_JSON, HookCategory, HookOutput, ResponseEnvelope};
use serde_json::json;

type CallLog = Arc<Mutex<Vec<String>>>;

enum Behavior {
    Succeed,
    Fail,
    Panic,
    Sleep(Duration),
}

struct Probe {
    name: &'static str,
    spec: MatchSpec,
    behavior: Behavior,
    calls: CallLog,
}

#[async_trait]
impl HookHandler for Probe {
    fn name(&self) -> &str {
        self.name
    }

    fn match_spec(&self) -> MatchSpec {
        self.spec
    }

    async fn handle(&self, _event: &HookEvent, _env: &HookEnv) -> Result<HookOutput> {
        match &self.behavior {
            Behavior::Succeed => {}
            Behavior::Fail => return Err(RelayError::handler(self.name, "disk full")),
            Behavior::Panic => panic!("{} blew up", self.name),
            Behavior::Sleep(d) => tokio::time::sleep(*d).await,
        }
        self.calls.lock().push(self.name.to_string());
        Ok(HookOutput::none())
    }
}

fn probe(name: &'static str, spec: MatchSpec, behavior: Behavior, calls: &CallLog) -> Arc<dyn HookHandler> {
    Arc::new(Probe {
        name,
        spec,
        behavior,
        calls: Arc::clone(calls),
    })
}

fn post_tool_bundle(calls: &CallLog) -> HookBundle {
    HookBundle::new(
        HookCategory::PostToolUse,
        vec![
            probe("wildcard", MatchSpec::Any, Behavior::Succeed, calls),
            probe("bash-only", MatchSpec::Tool("Bash"), Behavior::Succeed, calls),
            probe(
                "file-edits",
                MatchSpec::Tools(&["Write", "Edit"]),
                Behavior::Succeed,
                calls,
            ),
            probe("mcp", MatchSpec::McpPrefix, Behavior::Succeed, calls),
        ],
    )
    .unwrap()
}

fn sorted(calls: &CallLog) -> Vec<String> {
    let mut names = calls.lock().clone();
    names.sort();
    names
}

fn env() -> HookEnv {
    HookEnv::rooted("/nonexistent/project")
}

#[tokio::test]
async fn bash_event_runs_wildcard_and_bash_handlers_only() {
    let calls = CallLog::default();
    let bundle = post_tool_bundle(&calls);
    let report = dispatch(
        &bundle,
        &HookEvent::for_tool("Bash"),
        &env(),
        DispatchOptions::default(),
    )
    .await;

    assert_eq!(report.invoked(), vec!["wildcard", "bash-only"]);
    assert_eq!(sorted(&calls), vec!["bash-only", "wildcard"]);
    assert_eq!(report.envelope, ResponseEnvelope::silent());
}

#[tokio::test]
async fn mcp_event_runs_mcp_and_wildcard_handlers() {
    let calls = CallLog::default();
    let bundle = post_tool_bundle(&calls);
    let report = dispatch(
        &bundle,
        &HookEvent::for_tool("mcp__memory__store"),
        &env(),
        DispatchOptions::default(),
    )
    .await;
    assert_eq!(report.invoked(), vec!["wildcard", "mcp"]);
}

#[tokio::test]
async fn failures_are_isolated() {
    let calls = CallLog::default();
    let bundle = HookBundle::new(
        HookCategory::PostToolUse,
        vec![
            probe("before", MatchSpec::Any, Behavior::Succeed, &calls),
            probe("thrower", MatchSpec::Any, Behavior::Panic, &calls),
            probe("rejecter", MatchSpec::Any, Behavior::Fail, &calls),
            probe("after", MatchSpec::Any, Behavior::Succeed, &calls),
        ],
    )
    .unwrap();

    let report = dispatch(
        &bundle,
        &HookEvent::for_tool("Read"),
        &env(),
        DispatchOptions::default(),
    )
    .await;

    assert_eq!(sorted(&calls), vec!["after", "before"]);
    assert_eq!(report.outcomes.len(), 4);
    assert_eq!(report.failed(), vec!["thrower", "rejecter"]);
    assert_eq!(
        report.outcomes[1].error_message.as_deref(),
        Some("panicked: thrower blew up")
    );
    assert_eq!(report.outcomes[2].error_message.as_deref(), Some("disk full"));
    assert!(report.envelope.continue_);
}

#[tokio::test]
async fn failures_are_logged_individually_and_in_aggregate() {
    let (logs, _guard) = capture_logs();
    let calls = CallLog::default();
    let bundle = HookBundle::new(
        HookCategory::Stop,
        vec![
            probe("ok", MatchSpec::Any, Behavior::Succeed, &calls),
            probe("bad", MatchSpec::Any, Behavior::Fail, &calls),
            probe("worse", MatchSpec::Any, Behavior::Panic, &calls),
        ],
    )
    .unwrap();

    let _ = dispatch(&bundle, &HookEvent::default(), &env(), DispatchOptions::default()).await;

    assert!(logs.has_event(tracing::Level::WARN, "bad failed: disk full"));
    assert!(logs.has_message("worse failed: panicked"));
    assert!(logs.has_message("2/3 hooks failed: bad, worse"));
}

#[tokio::test(start_paused = true)]
async fn handlers_run_concurrently() {
    let calls = CallLog::default();
    let handlers = ["a", "b", "c", "d", "e"]
        .into_iter()
        .map(|name| {
            probe(
                name,
                MatchSpec::Any,
                Behavior::Sleep(Duration::from_millis(50)),
                &calls,
            )
        })
        .collect();
    let bundle = HookBundle::new(HookCategory::Notification, handlers).unwrap();

    let started = tokio::time::Instant::now();
    let report = dispatch(&bundle, &HookEvent::default(), &env(), DispatchOptions::default()).await;
    let elapsed = started.elapsed();

    assert_eq!(report.outcomes.len(), 5);
    assert_eq!(calls.lock().len(), 5);
    assert!(elapsed < Duration::from_millis(100), "took {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn slow_handler_times_out_without_blocking_siblings() {
    let calls = CallLog::default();
    let bundle = HookBundle::new(
        HookCategory::Stop,
        vec![
            probe("quick", MatchSpec::Any, Behavior::Succeed, &calls),
            probe(
                "stuck",
                MatchSpec::Any,
                Behavior::Sleep(Duration::from_secs(3600)),
                &calls,
            ),
        ],
    )
    .unwrap();

    let options = DispatchOptions::with_handler_timeout(Duration::from_millis(200));
    let report = dispatch(&bundle, &HookEvent::default(), &env(), options).await;

    assert_eq!(sorted(&calls), vec!["quick"]);
    assert_eq!(report.failed(), vec!["stuck"]);
    assert_eq!(
        report.outcomes[1].error_message.as_deref(),
        Some("timed out after 200ms")
    );
}

#[tokio::test]
async fn camel_and_snake_case_inputs_dispatch_identically() {
    let snake = normalize_value(json!({
        "tool_name": "Edit",
        "session_id": "s1",
        "tool_input": {"file_path": "/a.rs"}
    }));
    let camel = normalize_value(json!({
        "toolName": "Edit",
        "sessionId": "s1",
        "toolInput": {"file_path": "/a.rs"}
    }));

    let calls = CallLog::default();
    let bundle = post_tool_bundle(&calls);
    let a = dispatch(&bundle, &snake, &env(), DispatchOptions::default()).await;
    let b = dispatch(&bundle, &camel, &env(), DispatchOptions::default()).await;
    assert_eq!(a.invoked(), vec!["wildcard", "file-edits"]);
    assert_eq!(a.invoked(), b.invoked());
    assert_eq!(a.envelope, b.envelope);
}

#[tokio::test]
async fn unknown_and_empty_hook_ids_get_the_default_envelope() {
    let router = Router::builtin();
    let event = normalize_bytes(b"");
    let mut lines = Vec::new();
    for id in ["zzzfake/unified-dispatcher", "", "posttool/not-a-hook"] {
        let envelope = router
            .route(id, &event, &env(), DispatchOptions::default())
            .await;
        lines.push(envelope.to_json_line());
    }
    assert!(lines.iter().all(|l| l == FALLBACK_ENVELOPE_JSON), "{lines:?}");
}

#[tokio::test]
async fn write_event_through_builtin_router() {
    let tmp = tempfile::tempdir().unwrap();
    let env = HookEnv::rooted(tmp.path());
    let event = normalize_bytes(
        br#"{"tool_name": "Write", "session_id": "s1", "tool_input": {"file_path": "/tmp/x.ts"}}"#,
    );

    let report = Router::builtin()
        .dispatch(
            "posttool/unified-dispatcher",
            &event,
            &env,
            DispatchOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(
        report.invoked(),
        vec!["audit-log", "tool-metrics", "file-change-tracker"]
    );
    assert!(report.failed().is_empty(), "{:?}", report.outcomes);
    assert_eq!(report.envelope.to_json_line(), FALLBACK_ENVELOPE_JSON);

    let changed = std::fs::read_to_string(
        env.state_dir.join("changed-files").join("s1.txt"),
    )
    .unwrap();
    assert_eq!(changed, "/tmp/x.ts\n");
    assert!(env.log_file("audit.jsonl").exists());
    assert!(!env.log_file("bash-history.jsonl").exists());
}

#[tokio::test]
async fn session_start_surfaces_staged_context() {
    let tmp = tempfile::tempdir().unwrap();
    let env = HookEnv::rooted(tmp.path());
    let context_dir = tmp.path().join(".claude").join("context");
    std::fs::create_dir_all(&context_dir).unwrap();
    std::fs::write(context_dir.join("session-context.md"), "Resume the parser work.").unwrap();

    let event = normalize_value(json!({"session_id": "s1", "hook_event_name": "SessionStart"}));
    let envelope = Router::builtin()
        .route("lifecycle/unified-dispatcher", &event, &env, DispatchOptions::default())
        .await;

    let specific = envelope.hook_specific_output.unwrap();
    assert_eq!(specific["hookEventName"], "SessionStart");
    assert_eq!(specific["additionalContext"], "Resume the parser work.");
    assert!(envelope.continue_);
}

#[tokio::test]
async fn single_handler_route_is_still_match_gated() {
    let tmp = tempfile::tempdir().unwrap();
    let env = HookEnv::rooted(tmp.path());
    let report = Router::builtin()
        .dispatch(
            "posttool/bash-history",
            &HookEvent::for_tool("Read"),
            &env,
            DispatchOptions::default(),
        )
        .await
        .unwrap();
    assert!(report.outcomes.is_empty());
    assert!(!env.log_file("bash-history.jsonl").exists());
}
