use crate::common::error::{MarketError, Result};
use crate::domain::{Project, Review};
use crate::observability::metrics;
use crate::storage::Storage;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Use case accepting ratings from entitled users and keeping the
/// project's aggregate score current.
pub struct ReviewUseCase {
    storage: Arc<dyn Storage>,
}

impl ReviewUseCase {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn submit_review(
        &self,
        user_id: &str,
        project_id: Uuid,
        rating: u8,
        comment: Option<String>,
    ) -> Result<Project> {
        let outcome = self.run(user_id, project_id, rating, comment).await;
        match &outcome {
            Ok(_) => metrics::review::submitted(rating),
            Err(e) if e.is_expected() => metrics::review::rejected(e.label()),
            Err(_) => {}
        }
        outcome
    }

    async fn run(
        &self,
        user_id: &str,
        project_id: Uuid,
        rating: u8,
        comment: Option<String>,
    ) -> Result<Project> {
        if !(1..=5).contains(&rating) {
            return Err(MarketError::InvalidRating(rating));
        }

        self.storage
            .get_project_by_id(project_id)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("project {}", project_id)))?;

        if !self.storage.has_entitlement(user_id, project_id).await? {
            return Err(MarketError::NotEntitled);
        }

        let now = Utc::now();
        let mut review = Review {
            id: None,
            user_id: user_id.to_string(),
            project_id,
            rating,
            comment,
            created_at: now,
            updated_at: now,
        };
        let project = self.storage.upsert_review(&mut review).await?;

        info!(
            "Review stored: user {} project {} rating {} aggregate {:.2}",
            user_id, project_id, rating, project.rating
        );
        Ok(project)
    }
}
