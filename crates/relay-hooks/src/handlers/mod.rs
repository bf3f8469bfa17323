//! Built-in handlers and the bundle tables that assemble them.
//!
//! Every handler that can run for a category is listed in that category's
//! bundle function below, in the order it is reported.

pub mod notification;
pub mod post_tool;
pub mod session;
pub mod setup;
pub mod stop;
pub mod store;

use std::sync::Arc;

use relay_core::Result;

use crate::handler::HookHandler;
use crate::registry::HookBundle;
use crate::router::BundleLoader;
use crate::types::HookCategory;

/// Loader per category, as consumed by [`Router::builtin`](crate::router::Router::builtin).
pub const BUILTIN_LOADERS: &[(HookCategory, BundleLoader)] = &[
    (HookCategory::PostToolUse, post_tool_bundle),
    (HookCategory::SessionStart, session_start_bundle),
    (HookCategory::Stop, stop_bundle),
    (HookCategory::SubagentStop, subagent_stop_bundle),
    (HookCategory::Notification, notification_bundle),
    (HookCategory::Setup, setup_bundle),
];

/// Built-in bundle for `category`.
pub fn builtin_bundle(category: HookCategory) -> Result<HookBundle> {
    match category {
        HookCategory::PostToolUse => post_tool_bundle(),
        HookCategory::SessionStart => session_start_bundle(),
        HookCategory::Stop => stop_bundle(),
        HookCategory::SubagentStop => subagent_stop_bundle(),
        HookCategory::Notification => notification_bundle(),
        HookCategory::Setup => setup_bundle(),
    }
}

/// Post-tool-use handlers.
pub fn post_tool_bundle() -> Result<HookBundle> {
    let handlers: Vec<Arc<dyn HookHandler>> = vec![
        Arc::new(post_tool::AuditLog),
        Arc::new(post_tool::ToolMetrics),
        Arc::new(post_tool::BashHistory),
        Arc::new(post_tool::FileChangeTracker),
        Arc::new(post_tool::TaskTracker),
        Arc::new(post_tool::SkillUsage),
        Arc::new(post_tool::McpCallLog),
    ];
    HookBundle::new(HookCategory::PostToolUse, handlers)
}

/// Session-start handlers.
pub fn session_start_bundle() -> Result<HookBundle> {
    let handlers: Vec<Arc<dyn HookHandler>> = vec![
        Arc::new(session::InstanceRegister),
        Arc::new(session::ContextLoader),
    ];
    HookBundle::new(HookCategory::SessionStart, handlers)
}

/// Stop handlers.
pub fn stop_bundle() -> Result<HookBundle> {
    let handlers: Vec<Arc<dyn HookHandler>> = vec![
        Arc::new(stop::InstanceRelease),
        Arc::new(stop::SessionSummary),
    ];
    HookBundle::new(HookCategory::Stop, handlers)
}

/// Subagent-stop handlers.
pub fn subagent_stop_bundle() -> Result<HookBundle> {
    let handlers: Vec<Arc<dyn HookHandler>> = vec![Arc::new(stop::SubagentLog)];
    HookBundle::new(HookCategory::SubagentStop, handlers)
}

/// Notification handlers.
pub fn notification_bundle() -> Result<HookBundle> {
    let handlers: Vec<Arc<dyn HookHandler>> = vec![
        Arc::new(notification::NotificationLog),
        Arc::new(notification::WebhookForward),
    ];
    HookBundle::new(HookCategory::Notification, handlers)
}

/// Setup handlers.
pub fn setup_bundle() -> Result<HookBundle> {
    let handlers: Vec<Arc<dyn HookHandler>> = vec![
        Arc::new(setup::EnsureDirectories),
        Arc::new(setup::EnvironmentCheck),
    ];
    HookBundle::new(HookCategory::Setup, handlers)
}
