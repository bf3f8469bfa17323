//! Hook handler trait.
//!
//! Defines the [`HookHandler`] trait that every hook implementation
//! satisfies. Handlers are assembled into a
//! [`HookBundle`](crate::registry::HookBundle) per category and run by the
//! [`dispatcher`](crate::dispatcher).

use async_trait::async_trait;
use relay_core::RelayError;

use crate::env::HookEnv;
use crate::event::HookEvent;
use crate::matcher::MatchSpec;
use crate::types::HookOutput;

/// One independent hook action.
///
/// Handlers are side-effect-only and independent of each other: they run
/// concurrently with their siblings in no particular order, and must treat
/// their own I/O as best effort.
///
/// # Failure
///
/// Returning `Err` or panicking marks only this handler as failed; the
/// dispatch and its siblings are unaffected.
#[async_trait]
pub trait HookHandler: Send + Sync {
    /// Unique name within the handler's bundle.
    fn name(&self) -> &str;

    /// Which tool events this handler applies to. Default: every event.
    ///
    /// Only consulted in categories with per-tool matching.
    fn match_spec(&self) -> MatchSpec {
        MatchSpec::Any
    }

    /// Optional human-readable description.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Run the handler.
    async fn handle(&self, event: &HookEvent, env: &HookEnv) -> Result<HookOutput, RelayError>;
}
