use async_trait::async_trait;

/// Lookup against the external account service that owns user records.
/// Authentication happens upstream; this port only answers whether an
/// authenticated account is still active.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn is_active(&self, user_id: &str) -> Result<bool, String>;
}
