//! # relay-hooks
//!
//! Fan-out of one host hook event to every matching handler.
//!
//! A short-lived runner process receives one event per invocation. The event
//! is normalized once ([`event`]), routed to a category bundle ([`router`]),
//! filtered by each handler's [`MatchSpec`](matcher::MatchSpec), and the
//! matching handlers run concurrently on the current task ([`dispatcher`]).
//!
//! ## Fail-Open
//!
//! Nothing a handler does can change the response the host receives beyond
//! the optional message fields: errors, panics, and timeouts are recorded as
//! [`DispatchOutcome`](types::DispatchOutcome)s, logged, and swallowed. The
//! envelope always carries `continue: true`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use relay_hooks::dispatcher::DispatchOptions;
//! use relay_hooks::env::HookEnv;
//! use relay_hooks::event::normalize_bytes;
//! use relay_hooks::router::Router;
//!
//! # async fn run() {
//! let router = Router::builtin();
//! let event = normalize_bytes(br#"{"tool_name": "Bash", "session_id": "s1"}"#);
//! let env = HookEnv::rooted("/tmp/project");
//! let envelope = router
//!     .route("posttool/unified-dispatcher", &event, &env, DispatchOptions::default())
//!     .await;
//! assert!(envelope.continue_);
//! # }
//! ```

#![deny(unsafe_code)]

pub mod dispatcher;
pub mod env;
pub mod event;
pub mod handler;
pub mod handlers;
pub mod matcher;
pub mod registry;
pub mod router;
pub mod types;
