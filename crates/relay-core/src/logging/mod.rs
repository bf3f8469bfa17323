//! Structured logging with `tracing`.
//!
//! stdout belongs to the response envelope, so every diagnostic goes to a
//! side channel: stderr (warnings and above) and, when a log directory is
//! available, an append-only `hooks.log` file written through
//! [`tracing_appender`].
//!
//! `RUST_LOG` takes precedence over the configured level.

pub mod test_utils;

use std::path::Path;

use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use test_utils::{CapturedLogs, capture_logs};

/// File name of the side-channel log inside the log directory.
pub const LOG_FILE_NAME: &str = "hooks.log";

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize the global tracing subscriber with stderr output only.
///
/// Subsequent calls are no-ops.
pub fn init_subscriber(level: &str) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(true)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .compact();

    let _ = subscriber.try_init();
}

/// Initialize the global tracing subscriber with stderr output AND a log file.
///
/// The file receives everything allowed by `level`; stderr only carries
/// warnings and errors. If `dir` cannot be created or the log file cannot be
/// opened, falls back to [`init_subscriber`] and returns `false`.
pub fn init_subscriber_with_file(level: &str, dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        init_subscriber(level);
        return false;
    }

    let file_appender = match RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_NAME)
        .build(dir)
    {
        Ok(appender) => appender,
        Err(e) => {
            init_subscriber(level);
            tracing::warn!(error = %e, dir = %dir.display(), "log file unavailable, logging to stderr only");
            return false;
        }
    };

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(file_appender)
        .with_filter(env_filter(level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .compact()
        .with_filter(LevelFilter::WARN);

    let _ = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init();

    true
}
