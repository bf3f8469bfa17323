//! Hook identifier routing.
//!
//! A hook identifier is `<prefix>/<name>`. The prefix selects a category
//! bundle, which is built only when that category is requested. The name is
//! either [`BUNDLE_ENTRY`] (or empty), which runs the whole bundle, or the
//! name of one handler in it.

use relay_core::{RelayError, Result};
use tracing::{debug, warn};

use crate::dispatcher::{self, DispatchOptions, DispatchReport};
use crate::env::HookEnv;
use crate::event::HookEvent;
use crate::registry::HookBundle;
use crate::types::{HookCategory, HookInfo, ResponseEnvelope};

/// Builds the bundle for one category.
pub type BundleLoader = fn() -> Result<HookBundle>;

/// Handler name that selects the whole bundle.
pub const BUNDLE_ENTRY: &str = "unified-dispatcher";

/// What a hook identifier selects within its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    /// Every matching handler in the bundle.
    All,
    /// One handler by name.
    Handler(&'a str),
}

/// Parsed hook identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookId<'a> {
    /// Selected category.
    pub category: HookCategory,
    /// Selected handler(s).
    pub target: Target<'a>,
}

/// Parse `<prefix>/<name>`.
pub fn parse_hook_id(raw: &str) -> Result<HookId<'_>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(RelayError::Routing("empty hook id".to_string()));
    }
    let (prefix, name) = raw.split_once('/').unwrap_or((raw, ""));
    let category = HookCategory::from_prefix(prefix)
        .ok_or_else(|| RelayError::Routing(format!("unknown category '{prefix}'")))?;
    let target = match name {
        "" | BUNDLE_ENTRY => Target::All,
        other => Target::Handler(other),
    };
    Ok(HookId { category, target })
}

/// Maps hook identifiers to lazily built bundles.
pub struct Router {
    loaders: Vec<(HookCategory, BundleLoader)>,
}

impl Router {
    /// Router over an explicit loader table.
    #[must_use]
    pub fn new(loaders: Vec<(HookCategory, BundleLoader)>) -> Self {
        Self { loaders }
    }

    /// Router over the built-in handlers.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(crate::handlers::BUILTIN_LOADERS.to_vec())
    }

    fn loader(&self, category: HookCategory) -> Option<BundleLoader> {
        self.loaders
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, loader)| *loader)
    }

    /// Resolve `hook_id` and dispatch.
    ///
    /// Fails only with a routing error (or a bundle that could not be
    /// built); handler failures are part of the report.
    pub async fn dispatch(
        &self,
        hook_id: &str,
        event: &HookEvent,
        env: &HookEnv,
        options: DispatchOptions,
    ) -> Result<DispatchReport> {
        let id = parse_hook_id(hook_id)?;
        let loader = self.loader(id.category).ok_or_else(|| {
            RelayError::Routing(format!("no bundle registered for {}", id.category))
        })?;
        let bundle = loader()?;

        match id.target {
            Target::All => Ok(dispatcher::dispatch(&bundle, event, env, options).await),
            Target::Handler(name) => dispatcher::dispatch_one(&bundle, name, event, env, options)
                .await
                .ok_or_else(|| {
                    RelayError::Routing(format!("no hook '{name}' in {} bundle", id.category))
                }),
        }
    }

    /// Resolve `hook_id`, dispatch, and return the envelope. Never fails.
    pub async fn route(
        &self,
        hook_id: &str,
        event: &HookEvent,
        env: &HookEnv,
        options: DispatchOptions,
    ) -> ResponseEnvelope {
        match self.dispatch(hook_id, event, env, options).await {
            Ok(report) => report.envelope,
            Err(RelayError::Routing(reason)) => {
                debug!(hook_id, "{reason}");
                ResponseEnvelope::silent()
            }
            Err(err) => {
                warn!(hook_id, error = %err, "Failed to load hook bundle");
                ResponseEnvelope::silent()
            }
        }
    }

    /// Describe every registered handler. Bundles that fail to build are skipped.
    #[must_use]
    pub fn list(&self) -> Vec<HookInfo> {
        let mut infos = Vec::new();
        for (category, loader) in &self.loaders {
            match loader() {
                Ok(bundle) => infos.extend(bundle.list()),
                Err(err) => warn!(category = %category, error = %err, "Failed to load hook bundle"),
            }
        }
        infos
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let categories: Vec<_> = self.loaders.iter().map(|(c, _)| c.as_str()).collect();
        f.debug_struct("Router")
            .field("categories", &categories)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HookHandler;
    use crate::types::HookOutput;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Greeter(&'static str);

    #[async_trait]
    impl HookHandler for Greeter {
        fn name(&self) -> &str {
            self.0
        }
        async fn handle(&self, _event: &HookEvent, _env: &HookEnv) -> Result<HookOutput> {
            Ok(HookOutput::message(self.0))
        }
    }

    fn greeting_bundle() -> Result<HookBundle> {
        let handlers: Vec<Arc<dyn HookHandler>> =
            vec![Arc::new(Greeter("alpha")), Arc::new(Greeter("beta"))];
        HookBundle::new(HookCategory::SessionStart, handlers)
    }

    fn broken_bundle() -> Result<HookBundle> {
        Err(RelayError::Internal("bundle exploded".to_string()))
    }

    fn router() -> Router {
        Router::new(vec![
            (HookCategory::SessionStart, greeting_bundle as BundleLoader),
            (HookCategory::Stop, broken_bundle as BundleLoader),
        ])
    }

    async fn route(id: &str) -> ResponseEnvelope {
        router()
            .route(id, &HookEvent::default(), &HookEnv::rooted("/tmp"), DispatchOptions::default())
            .await
    }

    #[test]
    fn parses_hook_ids() {
        assert_eq!(
            parse_hook_id("posttool/unified-dispatcher").unwrap(),
            HookId {
                category: HookCategory::PostToolUse,
                target: Target::All
            }
        );
        assert_eq!(
            parse_hook_id(" lifecycle/context-loader\n").unwrap().target,
            Target::Handler("context-loader")
        );
        assert_eq!(parse_hook_id("stop").unwrap().target, Target::All);
        assert_eq!(parse_hook_id("stop/").unwrap().target, Target::All);
        assert_eq!(
            parse_hook_id("session-start/x").unwrap().category,
            HookCategory::SessionStart
        );
    }

    #[test]
    fn rejects_bad_ids() {
        assert_matches!(parse_hook_id(""), Err(RelayError::Routing(_)));
        assert_matches!(parse_hook_id("   "), Err(RelayError::Routing(_)));
        assert_matches!(
            parse_hook_id("zzzfake/unified-dispatcher"),
            Err(RelayError::Routing(ref r)) if r.contains("zzzfake")
        );
    }

    #[tokio::test]
    async fn bundle_entry_runs_every_handler() {
        let envelope = route("lifecycle/unified-dispatcher").await;
        assert_eq!(envelope.system_message.as_deref(), Some("alpha\nbeta"));
        assert!(!envelope.suppress_output);
    }

    #[tokio::test]
    async fn handler_name_runs_one_handler() {
        let envelope = route("lifecycle/beta").await;
        assert_eq!(envelope.system_message.as_deref(), Some("beta"));
    }

    #[tokio::test]
    async fn unknown_targets_yield_default_envelope() {
        for id in ["lifecycle/nope", "zzzfake/unified-dispatcher", "", "posttool/x"] {
            assert_eq!(route(id).await, ResponseEnvelope::silent(), "{id}");
        }
    }

    #[tokio::test]
    async fn failing_loader_yields_default_envelope() {
        assert_eq!(route("stop/unified-dispatcher").await, ResponseEnvelope::silent());
        let err = router()
            .dispatch(
                "stop",
                &HookEvent::default(),
                &HookEnv::rooted("/tmp"),
                DispatchOptions::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "bundle exploded");
    }

    #[test]
    fn list_skips_broken_bundles() {
        let names: Vec<_> = router().list().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn builtin_lists_every_category() {
        let list = Router::builtin().list();
        for category in HookCategory::all() {
            assert!(list.iter().any(|i| i.category == *category), "{category}");
        }
        assert!(format!("{:?}", Router::builtin()).contains("post-tool-use"));
    }
}
