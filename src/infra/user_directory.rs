use crate::app::ports::UserDirectory;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Mutex;

/// Directory backed by a local deny list. Every user is active unless
/// explicitly deactivated; the default directory for single-node runs
/// and tests.
pub struct StaticUserDirectory {
    deactivated: Mutex<HashSet<String>>,
}

impl StaticUserDirectory {
    pub fn new() -> Self {
        Self {
            deactivated: Mutex::new(HashSet::new()),
        }
    }

    pub fn deactivate(&self, user_id: &str) {
        self.deactivated.lock().unwrap().insert(user_id.to_string());
    }
}

impl Default for StaticUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn is_active(&self, user_id: &str) -> Result<bool, String> {
        Ok(!self.deactivated.lock().unwrap().contains(user_id))
    }
}

#[derive(Debug, Deserialize)]
struct UserStatusResponse {
    active: bool,
}

/// Directory that asks an upstream account service over HTTP.
pub struct HttpUserDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUserDirectory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn is_active(&self, user_id: &str) -> Result<bool, String> {
        let url = format!("{}/users/{}/status", self.base_url.trim_end_matches('/'), user_id);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            // Unknown accounts are treated as inactive, not as outages
            return Ok(false);
        }
        if !resp.status().is_success() {
            return Err(format!("user directory returned {}", resp.status()));
        }
        let body: UserStatusResponse = resp.json().await.map_err(|e| e.to_string())?;
        Ok(body.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_directory_defaults_to_active() {
        let directory = StaticUserDirectory::new();
        assert!(directory.is_active("user-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_deactivated_user_is_inactive() {
        let directory = StaticUserDirectory::new();
        directory.deactivate("user-1");
        assert!(!directory.is_active("user-1").await.unwrap());
        assert!(directory.is_active("user-2").await.unwrap());
    }
}
