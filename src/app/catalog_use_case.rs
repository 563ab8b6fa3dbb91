use crate::common::error::{MarketError, Result};
use crate::domain::{NewProject, Order, OrderStatus, Project, UpdateProjectFields};
use crate::observability::metrics;
use crate::storage::Storage;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Admin-side use case for maintaining catalog entries and correcting
/// ledger entries.
pub struct CatalogUseCase {
    storage: Arc<dyn Storage>,
}

impl CatalogUseCase {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn create_project(&self, input: NewProject) -> Result<Project> {
        if input.title.trim().is_empty() {
            return Err(MarketError::MissingField("title".to_string()));
        }
        if input.slug.trim().is_empty() {
            return Err(MarketError::MissingField("slug".to_string()));
        }
        if input.price_cents < 0 {
            return Err(MarketError::InvalidField(
                "price_cents must not be negative".to_string(),
            ));
        }

        let mut project = Project {
            id: None,
            title: input.title,
            slug: input.slug,
            description: input.description,
            price_cents: input.price_cents,
            is_free: input.is_free,
            is_published: input.is_published,
            source_url: input.source_url,
            purchases: 0,
            downloads: 0,
            rating: 0.0,
            created_at: Utc::now(),
        };
        self.storage.create_project(&mut project).await?;

        metrics::catalog::project_created();
        info!("Project created: {} ({})", project.title, project.slug);
        Ok(project)
    }

    pub async fn update_project(
        &self,
        project_id: Uuid,
        fields: UpdateProjectFields,
    ) -> Result<Project> {
        if let Some(title) = &fields.title {
            if title.trim().is_empty() {
                return Err(MarketError::InvalidField(
                    "title must not be empty".to_string(),
                ));
            }
        }
        if let Some(price) = fields.price_cents {
            if price < 0 {
                return Err(MarketError::InvalidField(
                    "price_cents must not be negative".to_string(),
                ));
            }
        }

        let project = self.storage.update_project_fields(project_id, &fields).await?;

        metrics::catalog::project_updated();
        info!("Project updated: {} ({})", project.title, project_id);
        Ok(project)
    }

    pub async fn set_order_status(&self, order_id: Uuid, status: OrderStatus) -> Result<Order> {
        let order = self.storage.set_order_status(order_id, status).await?;

        metrics::catalog::order_status_changed(&status.to_string());
        info!(
            "Order {} moved to {}: user {} project {}",
            order.order_number, status, order.user_id, order.project_id
        );
        Ok(order)
    }
}
