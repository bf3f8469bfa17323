//! Error hierarchy for the hook relay.
//!
//! Every failure the relay can observe falls into one of four kinds (see
//! [`ErrorKind`]). None of them ever reach the host: input and routing errors
//! degrade to defaults, handler errors are isolated per handler, and anything
//! else is caught by the runner and replaced with the default envelope.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// How a failure is treated by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Missing or malformed stdin. Recovered by defaulting.
    Input,
    /// Unknown hook identifier or category. Recovered with the default envelope.
    Routing,
    /// A single handler failed. Isolated from its siblings.
    Handler,
    /// Anything else. Caught at the outermost boundary.
    Catastrophic,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Routing => write!(f, "routing"),
            Self::Handler => write!(f, "handler"),
            Self::Catastrophic => write!(f, "catastrophic"),
        }
    }
}

/// Top-level error type for the hook relay.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Hook input could not be read or understood.
    #[error("invalid hook input: {0}")]
    Input(String),

    /// Hook identifier did not resolve to a bundle or handler.
    #[error("unknown hook: {0}")]
    Routing(String),

    /// A handler returned an error.
    #[error("{message}")]
    Handler {
        /// Handler name.
        name: String,
        /// Error message from the handler.
        message: String,
    },

    /// A handler panicked.
    #[error("panicked: {message}")]
    Panic {
        /// Handler name.
        name: String,
        /// Panic payload, if it was a string.
        message: String,
    },

    /// A handler exceeded the configured per-handler timeout.
    #[error("timed out after {timeout_ms}ms")]
    Timeout {
        /// Handler name.
        name: String,
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic internal error.
    #[error("{0}")]
    Internal(String),
}

impl RelayError {
    /// Create a handler error.
    #[must_use]
    pub fn handler(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Handler {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Which [`ErrorKind`] this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Input(_) => ErrorKind::Input,
            Self::Routing(_) => ErrorKind::Routing,
            Self::Handler { .. } | Self::Panic { .. } | Self::Timeout { .. } => {
                ErrorKind::Handler
            }
            Self::Io(_) | Self::Json(_) | Self::Internal(_) => ErrorKind::Catastrophic,
        }
    }
}
