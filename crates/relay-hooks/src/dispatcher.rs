//! Concurrent fail-open dispatch.
//!
//! [`dispatch`] runs every matching handler of a bundle concurrently on the
//! current task and waits for all of them. [`settle_all`] is the single
//! combinator behind it: each future is guarded against panics (and,
//! optionally, a per-handler timeout), so every handler yields exactly one
//! result and nothing escapes.
//!
//! Failures are logged individually (`"<name> failed: <message>"`) and once
//! in aggregate (`"<k>/<n> hooks failed: <names>"`). The returned envelope
//! is the same whether handlers failed or not.
//!
//! Without a configured timeout a slow handler delays the whole dispatch,
//! and with it the host.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::join_all;
use relay_core::RelayError;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::env::HookEnv;
use crate::event::HookEvent;
use crate::handler::HookHandler;
use crate::matcher;
use crate::registry::HookBundle;
use crate::types::{DispatchOutcome, HookCategory, HookOutput, ResponseEnvelope};

/// Per-dispatch knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Upper bound for each handler. `None` waits for every handler.
    pub handler_timeout: Option<Duration>,
}

impl DispatchOptions {
    /// Options with a per-handler timeout.
    #[must_use]
    pub fn with_handler_timeout(timeout: Duration) -> Self {
        Self {
            handler_timeout: Some(timeout),
        }
    }
}

/// Envelope plus the per-handler outcomes that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    /// Response for the host.
    pub envelope: ResponseEnvelope,
    /// One outcome per invoked handler, in registration order.
    pub outcomes: Vec<DispatchOutcome>,
}

impl DispatchReport {
    /// Report for a dispatch that invoked nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            envelope: ResponseEnvelope::silent(),
            outcomes: Vec::new(),
        }
    }

    /// Names of handlers that ran.
    #[must_use]
    pub fn invoked(&self) -> Vec<&str> {
        self.outcomes.iter().map(|o| o.handler_name.as_str()).collect()
    }

    /// Names of handlers that failed.
    #[must_use]
    pub fn failed(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.succeeded)
            .map(|o| o.handler_name.as_str())
            .collect()
    }

    /// `"<k>/<n> hooks failed: a, b"`, or `None` when everything succeeded.
    #[must_use]
    pub fn failure_summary(&self) -> Option<String> {
        let failed = self.failed();
        if failed.is_empty() {
            return None;
        }
        Some(format!(
            "{}/{} hooks failed: {}",
            failed.len(),
            self.outcomes.len(),
            failed.join(", ")
        ))
    }
}

/// Run named futures concurrently and collect every result.
///
/// Never short-circuits: a panic becomes [`RelayError::Panic`] and an
/// exceeded `timeout` becomes [`RelayError::Timeout`] for that entry only.
/// Results come back in input order.
pub async fn settle_all<T, F>(
    tasks: Vec<(String, F)>,
    timeout: Option<Duration>,
) -> Vec<(String, Result<T, RelayError>)>
where
    F: Future<Output = Result<T, RelayError>>,
{
    join_all(
        tasks
            .into_iter()
            .map(|(name, future)| settle_one(name, future, timeout)),
    )
    .await
}

async fn settle_one<T, F>(
    name: String,
    future: F,
    timeout: Option<Duration>,
) -> (String, Result<T, RelayError>)
where
    F: Future<Output = Result<T, RelayError>>,
{
    let guarded = AssertUnwindSafe(future).catch_unwind();
    let caught = match timeout {
        Some(limit) => {
            if let Ok(caught) = tokio::time::timeout(limit, guarded).await {
                caught
            } else {
                let timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
                let err = RelayError::Timeout {
                    name: name.clone(),
                    timeout_ms,
                };
                return (name, Err(err));
            }
        }
        None => guarded.await,
    };

    let result = caught.unwrap_or_else(|payload| {
        Err(RelayError::Panic {
            name: name.clone(),
            message: panic_message(payload.as_ref()),
        })
    });
    (name, result)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run every handler in `bundle` that matches `event`.
pub async fn dispatch(
    bundle: &HookBundle,
    event: &HookEvent,
    env: &HookEnv,
    options: DispatchOptions,
) -> DispatchReport {
    let handlers = bundle.matching(event);
    run_handlers(bundle.category(), &handlers, event, env, options).await
}

/// Run a single named handler from `bundle`, still gated by its match spec.
///
/// Returns `None` when the bundle has no handler with that name.
pub async fn dispatch_one(
    bundle: &HookBundle,
    name: &str,
    event: &HookEvent,
    env: &HookEnv,
    options: DispatchOptions,
) -> Option<DispatchReport> {
    let handler = bundle.get(name)?;
    let applies = !bundle.category().has_tool_matching()
        || matcher::matches(event, handler.match_spec());
    let handlers = if applies { vec![handler] } else { Vec::new() };
    Some(run_handlers(bundle.category(), &handlers, event, env, options).await)
}

async fn run_handlers(
    category: HookCategory,
    handlers: &[Arc<dyn HookHandler>],
    event: &HookEvent,
    env: &HookEnv,
    options: DispatchOptions,
) -> DispatchReport {
    if handlers.is_empty() {
        debug!(category = %category, tool = %event.tool_name, "No hooks matched");
        return DispatchReport::empty();
    }

    let tasks: Vec<_> = handlers
        .iter()
        .map(|handler| {
            let handler = Arc::clone(handler);
            let name = handler.name().to_string();
            (name, async move { handler.handle(event, env).await })
        })
        .collect();

    let settled = settle_all(tasks, options.handler_timeout).await;
    let total = settled.len();

    let mut outcomes = Vec::with_capacity(total);
    let mut outputs = Vec::with_capacity(total);
    for (index, (name, result)) in settled.into_iter().enumerate() {
        let succeeded = match result {
            Ok(output) => {
                outcomes.push(DispatchOutcome::success(&name));
                outputs.push(output);
                true
            }
            Err(err) => {
                warn!(category = %category, hook = %name, "{name} failed: {err}");
                outcomes.push(DispatchOutcome::failure(&name, err.to_string()));
                false
            }
        };
        if category == HookCategory::Setup {
            let status = if succeeded { "ok" } else { "failed" };
            info!("[setup] {}/{total} {name}: {status}", index + 1);
        }
    }

    let report = DispatchReport {
        envelope: build_envelope(category, outputs),
        outcomes,
    };
    if let Some(summary) = report.failure_summary() {
        warn!(category = %category, "{summary}");
    }
    debug!(
        category = %category,
        invoked = total,
        failed = report.failed().len(),
        "Dispatch complete"
    );
    report
}

/// Fold handler outputs into the envelope for `category`.
///
/// Categories that do not surface output always get the silent envelope.
#[must_use]
pub fn build_envelope(category: HookCategory, outputs: Vec<HookOutput>) -> ResponseEnvelope {
    if !category.surfaces_output() {
        return ResponseEnvelope::silent();
    }

    let mut messages = Vec::new();
    let mut specific: Option<Value> = None;
    for output in outputs {
        if let Some(message) = output.system_message.filter(|m| !m.trim().is_empty()) {
            messages.push(message);
        }
        if let Some(value) = output.hook_specific_output {
            specific = Some(match specific {
                Some(acc) => merge_specific(acc, value),
                None => value,
            });
        }
    }

    let hook_specific_output = specific.map(|mut value| {
        if let Value::Object(map) = &mut value {
            let _ = map
                .entry("hookEventName")
                .or_insert_with(|| Value::String(category.hook_event_name().to_string()));
        }
        value
    });

    ResponseEnvelope {
        continue_: true,
        suppress_output: messages.is_empty(),
        system_message: (!messages.is_empty()).then(|| messages.join("\n")),
        hook_specific_output,
    }
}

/// Recursive merge of handler outputs.
///
/// Objects merge per key, `additionalContext` strings are concatenated, and
/// anything else is replaced by the later handler's value. Nulls are skipped.
fn merge_specific(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, value) in source_map {
                if value.is_null() {
                    continue;
                }
                let merged = match (key.as_str(), target_map.remove(&key), value) {
                    ("additionalContext", Some(Value::String(a)), Value::String(b)) => {
                        Value::String(format!("{a}\n\n{b}"))
                    }
                    (_, Some(existing), value) => merge_specific(existing, value),
                    (_, None, value) => value,
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}
