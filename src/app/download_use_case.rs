use crate::common::error::{MarketError, Result};
use crate::observability::metrics;
use crate::storage::Storage;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// A granted download: where to fetch the artifact and how many attempts
/// the order still holds.
#[derive(Debug, Clone)]
pub struct DownloadGrant {
    pub download_url: String,
    pub remaining: u32,
    pub order_number: String,
}

/// Use case gating artifact downloads on the order ledger's quota.
pub struct DownloadUseCase {
    storage: Arc<dyn Storage>,
}

impl DownloadUseCase {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn request_download(&self, user_id: &str, project_id: Uuid) -> Result<DownloadGrant> {
        let grant = self.run(user_id, project_id).await;
        match &grant {
            Ok(g) => metrics::download::granted(g.remaining),
            Err(e) if e.is_expected() => metrics::download::denied(e.label()),
            Err(_) => {}
        }
        grant
    }

    async fn run(&self, user_id: &str, project_id: Uuid) -> Result<DownloadGrant> {
        let project = self
            .storage
            .get_project_by_id(project_id)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("project {}", project_id)))?;

        // Resolve the artifact before touching the quota so that a
        // misconfigured project never burns a download slot.
        let download_url = project.source_url.ok_or_else(|| MarketError::Storage {
            message: format!("project {} has no download artifact", project_id),
        })?;

        let claim = self
            .storage
            .try_consume_download(user_id, project_id, Utc::now())
            .await?;

        // Running total on the project is best effort
        if let Err(e) = self.storage.increment_download_count(project_id).await {
            warn!("Download counter bump failed for {}: {}", project_id, e);
        }

        info!(
            "Download granted: user {} project {} order {} remaining {}",
            user_id, project_id, claim.order.order_number, claim.remaining
        );
        Ok(DownloadGrant {
            download_url,
            remaining: claim.remaining,
            order_number: claim.order.order_number,
        })
    }
}
