//! Hook bundles.
//!
//! A [`HookBundle`] is the complete, ordered handler table for one
//! [`HookCategory`]. Bundles are built explicitly and never mutated, so every
//! handler that can run for a category is visible where its bundle is
//! assembled (see [`handlers`](crate::handlers)).

use std::collections::HashSet;
use std::sync::Arc;

use relay_core::{RelayError, Result};
use tracing::debug;

use crate::event::HookEvent;
use crate::handler::HookHandler;
use crate::matcher;
use crate::types::{HookCategory, HookInfo};

/// Immutable handler table for one category.
pub struct HookBundle {
    category: HookCategory,
    /// Handlers in registration order.
    handlers: Vec<Arc<dyn HookHandler>>,
}

impl HookBundle {
    /// Build a bundle. Handler names must be unique within the bundle.
    pub fn new(category: HookCategory, handlers: Vec<Arc<dyn HookHandler>>) -> Result<Self> {
        {
            let mut seen = HashSet::new();
            for handler in &handlers {
                if !seen.insert(handler.name()) {
                    return Err(RelayError::Internal(format!(
                        "duplicate hook '{}' in {category} bundle",
                        handler.name()
                    )));
                }
            }
        }
        debug!(category = %category, count = handlers.len(), "Built hook bundle");
        Ok(Self { category, handlers })
    }

    /// Category this bundle serves.
    #[must_use]
    pub fn category(&self) -> HookCategory {
        self.category
    }

    /// Handlers that apply to `event`, in registration order.
    ///
    /// Categories without per-tool matching return every handler.
    #[must_use]
    pub fn matching(&self, event: &HookEvent) -> Vec<Arc<dyn HookHandler>> {
        if !self.category.has_tool_matching() {
            return self.handlers.clone();
        }
        self.handlers
            .iter()
            .filter(|h| matcher::matches(event, h.match_spec()))
            .cloned()
            .collect()
    }

    /// Get a handler by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn HookHandler>> {
        self.handlers.iter().find(|h| h.name() == name).cloned()
    }

    /// Handler names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// Number of handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the bundle has no handlers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Describe every handler, in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<HookInfo> {
        self.handlers
            .iter()
            .map(|h| HookInfo {
                name: h.name().to_string(),
                category: self.category,
                match_spec: h.match_spec().to_string(),
                description: h.description().map(ToString::to_string),
            })
            .collect()
    }
}

impl std::fmt::Debug for HookBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookBundle")
            .field("category", &self.category)
            .field("hook_count", &self.handlers.len())
            .finish()
    }
}
