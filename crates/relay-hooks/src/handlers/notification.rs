//! Notification handlers.

use async_trait::async_trait;
use relay_core::{RelayError, Result};
use serde_json::json;
use tracing::debug;

use super::store;
use crate::env::HookEnv;
use crate::event::HookEvent;
use crate::handler::HookHandler;
use crate::types::HookOutput;

fn notification_payload(event: &HookEvent) -> serde_json::Value {
    json!({
        "timestamp": store::timestamp(),
        "sessionId": event.session_id,
        "notificationType": event.notification_type,
        "message": event.message,
        "cwd": event.cwd,
    })
}

/// Appends host notifications to `notifications.jsonl`.
pub struct NotificationLog;

#[async_trait]
impl HookHandler for NotificationLog {
    fn name(&self) -> &str {
        "notification-log"
    }

    fn description(&self) -> Option<&str> {
        Some("Record host notifications")
    }

    async fn handle(&self, event: &HookEvent, env: &HookEnv) -> Result<HookOutput> {
        store::append_jsonl(&env.log_file("notifications.jsonl"), &notification_payload(event))
            .await?;
        Ok(HookOutput::none())
    }
}

/// POSTs notifications to the configured webhook.
pub struct WebhookForward;

#[async_trait]
impl HookHandler for WebhookForward {
    fn name(&self) -> &str {
        "webhook-forward"
    }

    fn description(&self) -> Option<&str> {
        Some("Forward notifications to a webhook")
    }

    async fn handle(&self, event: &HookEvent, env: &HookEnv) -> Result<HookOutput> {
        let Some(url) = env.webhook_url.as_deref() else {
            return Ok(HookOutput::none());
        };

        let client = reqwest::Client::builder()
            .timeout(env.webhook_timeout)
            .user_agent(concat!("hook-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RelayError::handler(self.name(), format!("HTTP client: {e}")))?;

        let response = client
            .post(url)
            .json(&notification_payload(event))
            .send()
            .await
            .map_err(|e| RelayError::handler(self.name(), format!("webhook request failed: {e}")))?;
        let status = response.status();
        let _ = response
            .error_for_status()
            .map_err(|e| RelayError::handler(self.name(), format!("webhook rejected: {e}")))?;

        debug!(status = status.as_u16(), "Forwarded notification");
        Ok(HookOutput::none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::normalize_value;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn idle_event() -> HookEvent {
        normalize_value(json!({
            "session_id": "s1",
            "notification_type": "idle_prompt",
            "message": "Claude is waiting for your input"
        }))
    }

    fn webhook_env(server: &MockServer) -> HookEnv {
        HookEnv::rooted("/w").with_webhook(format!("{}/hook", server.uri()), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn notification_log_appends() {
        let tmp = tempfile::tempdir().unwrap();
        let env = HookEnv::rooted(tmp.path());
        let _ = NotificationLog.handle(&idle_event(), &env).await.unwrap();
        let content = std::fs::read_to_string(env.log_file("notifications.jsonl")).unwrap();
        let record: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(record["notificationType"], "idle_prompt");
        assert_eq!(record["message"], "Claude is waiting for your input");
    }

    #[tokio::test]
    async fn webhook_without_url_is_noop() {
        let env = HookEnv::rooted("/nonexistent");
        let out = WebhookForward.handle(&idle_event(), &env).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn webhook_posts_payload() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(json!({
                "sessionId": "s1",
                "notificationType": "idle_prompt"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let out = WebhookForward
            .handle(&idle_event(), &webhook_env(&server))
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn webhook_error_status_fails() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = WebhookForward
            .handle(&idle_event(), &webhook_env(&server))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("webhook rejected"));
        assert!(err.to_string().contains("500"));
    }
}
