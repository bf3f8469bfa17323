//! # relay-cli
//!
//! Pieces of the `run-hook` binary that do not touch process-global state:
//! settings to handler environment, stdin capture, and one full
//! normalize-route-dispatch pass.

#![deny(unsafe_code)]

use std::io::{IsTerminal, Write};
use std::time::Duration;

use relay_hooks::dispatcher::DispatchOptions;
use relay_hooks::env::HookEnv;
use relay_hooks::event::normalize_bytes;
use relay_hooks::router::Router;
use relay_hooks::types::ResponseEnvelope;
use relay_settings::RelaySettings;
use tokio::io::AsyncReadExt;
use tracing::{debug, error, info};

/// Resolve handler locations and endpoints from settings.
pub fn hook_env(settings: &RelaySettings) -> HookEnv {
    let env = HookEnv::new(
        settings.project_dir(),
        settings.state_dir(),
        settings.log_dir(),
    );
    match settings.notifications.webhook_url.as_deref() {
        Some(url) if !url.trim().is_empty() => env.with_webhook(
            url.trim(),
            Duration::from_millis(settings.notifications.webhook_timeout_ms),
        ),
        _ => env,
    }
}

/// Dispatch options from settings.
pub fn dispatch_options(settings: &RelaySettings) -> DispatchOptions {
    DispatchOptions {
        handler_timeout: settings
            .dispatch
            .handler_timeout_ms
            .map(Duration::from_millis),
    }
}

/// Read all of stdin, waiting at most `timeout`.
///
/// A terminal, a read error, or a timeout all count as empty input.
pub async fn read_stdin(timeout: Duration) -> Vec<u8> {
    if std::io::stdin().is_terminal() {
        debug!("stdin is a terminal, treating input as empty");
        return Vec::new();
    }

    let mut buf = Vec::new();
    let read = tokio::time::timeout(timeout, tokio::io::stdin().read_to_end(&mut buf)).await;
    match read {
        Ok(Ok(n)) => {
            debug!(bytes = n, "read hook input");
            buf
        }
        Ok(Err(e)) => {
            debug!(error = %e, "failed to read stdin, treating input as empty");
            Vec::new()
        }
        Err(_) => {
            debug!(?timeout, "stdin not closed in time, treating input as empty");
            Vec::new()
        }
    }
}

/// Normalize `raw`, route it to `hook_id`, and return the envelope.
pub async fn execute(
    router: &Router,
    hook_id: &str,
    raw: &[u8],
    settings: &RelaySettings,
) -> ResponseEnvelope {
    let event = normalize_bytes(raw);
    let env = hook_env(settings);
    info!(
        hook_id,
        tool = %event.tool_name,
        session = %event.session_id,
        "dispatching hook"
    );
    router
        .route(hook_id, &event, &env, dispatch_options(settings))
        .await
}

/// The single stdout line for `envelope`.
pub fn render(envelope: &ResponseEnvelope) -> String {
    envelope.to_json_line()
}

/// Route panic reports to tracing, or to stderr before logging is up.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        report_panic(&info.to_string(), &mut std::io::stderr());
    }));
}

/// Log a panic report. Without a global subscriber it is written to `fallback`.
pub fn report_panic(report: &str, fallback: &mut dyn Write) {
    if tracing::dispatcher::has_been_set() {
        error!("{report}");
    } else {
        let _ = writeln!(fallback, "run-hook: {report}");
    }
}

/// Registered hooks as pretty JSON, for `--list`.
pub fn render_list(router: &Router) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&router.list())?)
}
