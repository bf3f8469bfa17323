//! # run-hook
//!
//! Invoked by the host once per hook event:
//!
//! ```text
//! echo '{"tool_name":"Bash",...}' | run-hook posttool/unified-dispatcher
//! ```
//!
//! Writes exactly one JSON line to stdout and always exits 0. Diagnostics go
//! to stderr and `hooks.log`.

#![deny(unsafe_code)]

use std::io::Write;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use relay_hooks::router::Router;
use relay_hooks::types::FALLBACK_ENVELOPE_JSON;
use relay_settings::RelaySettings;
use tracing::{error, warn};

/// Hook runner.
#[derive(Parser, Debug)]
#[command(name = "run-hook", about = "Dispatch one hook event to its handlers", version)]
struct Cli {
    /// Hook identifier: `<category>/<name>`, e.g. `posttool/unified-dispatcher`.
    hook_id: Option<String>,

    /// Hook input JSON. Replaces stdin.
    #[arg(long)]
    input: Option<String>,

    /// Print the registered hooks as JSON and exit.
    #[arg(long)]
    list: bool,
}

fn load_settings() -> (RelaySettings, Option<relay_settings::SettingsError>) {
    match relay_settings::load_settings() {
        Ok(settings) => (settings, None),
        Err(err) => {
            let mut settings = RelaySettings::default();
            relay_settings::loader::apply_env_overrides(&mut settings);
            (settings, Some(err))
        }
    }
}

fn init_logging(settings: &RelaySettings) {
    let level = settings.logging.level.as_str();
    if settings.logging.file {
        let _ = relay_core::logging::init_subscriber_with_file(level, &settings.log_dir());
    } else {
        relay_core::logging::init_subscriber(level);
    }
}

fn run() -> Result<String> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            return Ok(err.render().to_string().trim_end().to_string());
        }
        Err(err) => {
            // Logging is not up yet; stderr is the only channel.
            eprintln!("run-hook: {}", err.kind());
            return Ok(FALLBACK_ENVELOPE_JSON.to_string());
        }
    };

    let (settings, settings_err) = load_settings();
    init_logging(&settings);
    if let Some(err) = settings_err {
        warn!(error = %err, "failed to load settings, using defaults");
    }

    let router = Router::builtin();
    if cli.list {
        return relay_cli::render_list(&router);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;

    let hook_id = cli.hook_id.unwrap_or_default();
    let envelope = runtime.block_on(async {
        let raw = match cli.input {
            Some(input) => input.into_bytes(),
            None => {
                relay_cli::read_stdin(Duration::from_millis(settings.dispatch.stdin_timeout_ms))
                    .await
            }
        };
        relay_cli::execute(&router, &hook_id, &raw, &settings).await
    });
    // A stdin read that timed out may still hold a blocking thread.
    runtime.shutdown_background();

    Ok(relay_cli::render(&envelope))
}

fn main() {
    relay_cli::install_panic_hook();

    let line = match std::panic::catch_unwind(AssertUnwindSafe(run)) {
        Ok(Ok(line)) => line,
        Ok(Err(err)) => {
            error!(error = %err, "run-hook failed");
            FALLBACK_ENVELOPE_JSON.to_string()
        }
        Err(_) => FALLBACK_ENVELOPE_JSON.to_string(),
    };

    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "{line}");
    let _ = stdout.flush();
    drop(stdout);
    std::process::exit(0);
}
