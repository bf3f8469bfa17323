//! Setup handlers.

use async_trait::async_trait;
use relay_core::Result;

use crate::env::HookEnv;
use crate::event::HookEvent;
use crate::handler::HookHandler;
use crate::types::HookOutput;

/// Creates the state and log directories.
pub struct EnsureDirectories;

#[async_trait]
impl HookHandler for EnsureDirectories {
    fn name(&self) -> &str {
        "ensure-directories"
    }

    fn description(&self) -> Option<&str> {
        Some("Create hook state and log directories")
    }

    async fn handle(&self, _event: &HookEvent, env: &HookEnv) -> Result<HookOutput> {
        tokio::fs::create_dir_all(&env.state_dir).await?;
        tokio::fs::create_dir_all(&env.log_dir).await?;
        Ok(HookOutput::none())
    }
}

/// Warns when the project directory is missing.
pub struct EnvironmentCheck;

#[async_trait]
impl HookHandler for EnvironmentCheck {
    fn name(&self) -> &str {
        "environment-check"
    }

    fn description(&self) -> Option<&str> {
        Some("Check the project directory exists")
    }

    async fn handle(&self, _event: &HookEvent, env: &HookEnv) -> Result<HookOutput> {
        if tokio::fs::metadata(&env.project_dir)
            .await
            .is_ok_and(|m| m.is_dir())
        {
            return Ok(HookOutput::none());
        }
        Ok(HookOutput::message(format!(
            "Project directory {} does not exist; hook state will not persist",
            env.project_dir.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let env = HookEnv::rooted(tmp.path());
        let _ = EnsureDirectories
            .handle(&HookEvent::default(), &env)
            .await
            .unwrap();
        assert!(env.state_dir.is_dir());
        assert!(env.log_dir.is_dir());
    }

    #[tokio::test]
    async fn existing_project_passes_check() {
        let tmp = tempfile::tempdir().unwrap();
        let env = HookEnv::rooted(tmp.path());
        let out = EnvironmentCheck.handle(&HookEvent::default(), &env).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn missing_project_warns() {
        let tmp = tempfile::tempdir().unwrap();
        let env = HookEnv::rooted(tmp.path().join("gone"));
        let out = EnvironmentCheck.handle(&HookEvent::default(), &env).await.unwrap();
        assert!(out.system_message.unwrap().contains("does not exist"));
    }
}
