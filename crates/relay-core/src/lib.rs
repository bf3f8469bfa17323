//! # relay-core
//!
//! Foundation shared by every hook-relay crate:
//!
//! - **Errors**: [`RelayError`] via `thiserror`, classified into the
//!   [`ErrorKind`] taxonomy that decides how a failure is swallowed
//! - **Logging**: `tracing` subscriber setup with stderr output and an
//!   optional side-channel log file

#![deny(unsafe_code)]

pub mod errors;
pub mod logging;

pub use errors::{ErrorKind, RelayError, Result};
