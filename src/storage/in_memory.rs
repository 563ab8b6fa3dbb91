use super::traits::{DownloadClaim, Storage};
use crate::common::error::{MarketError, Result};
use crate::domain::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// In-memory storage implementation. Every trait method runs entirely under
/// its entity lock, which is what makes the ledger and quota updates
/// linearizable without any coordination in the application layer.
pub struct InMemoryStorage {
    projects: Arc<Mutex<HashMap<Uuid, Project>>>,
    orders: Arc<Mutex<HashMap<Uuid, Order>>>,
    entitlements: Arc<Mutex<HashMap<(String, Uuid), Entitlement>>>,
    reviews: Arc<Mutex<HashMap<(String, Uuid), Review>>>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            projects: Arc::new(Mutex::new(HashMap::new())),
            orders: Arc::new(Mutex::new(HashMap::new())),
            entitlements: Arc::new(Mutex::new(HashMap::new())),
            reviews: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_project(&self, project: &mut Project) -> Result<()> {
        let mut projects = self.projects.lock().unwrap();
        if projects
            .values()
            .any(|p| p.slug.to_lowercase() == project.slug.to_lowercase())
        {
            return Err(MarketError::InvalidField(format!(
                "slug '{}' is already in use",
                project.slug
            )));
        }

        let id = Uuid::new_v4();
        project.id = Some(id);
        projects.insert(id, project.clone());

        debug!("Created project: {} with id {}", project.title, id);
        Ok(())
    }

    async fn get_project_by_id(&self, project_id: Uuid) -> Result<Option<Project>> {
        let projects = self.projects.lock().unwrap();
        Ok(projects.get(&project_id).cloned())
    }

    async fn get_project_by_slug(&self, slug: &str) -> Result<Option<Project>> {
        let projects = self.projects.lock().unwrap();
        let project = projects
            .values()
            .find(|p| p.slug.to_lowercase() == slug.to_lowercase())
            .cloned();
        Ok(project)
    }

    async fn get_all_projects(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<Project>> {
        let projects = self.projects.lock().unwrap();
        let mut all_projects: Vec<Project> = projects.values().cloned().collect();
        all_projects.sort_by(|a, b| a.title.cmp(&b.title));

        let offset = offset.unwrap_or(0);
        let end = if let Some(limit) = limit {
            std::cmp::min(offset.saturating_add(limit), all_projects.len())
        } else {
            all_projects.len()
        };

        Ok(all_projects.get(offset..end).unwrap_or(&[]).to_vec())
    }

    async fn update_project_fields(
        &self,
        project_id: Uuid,
        fields: &UpdateProjectFields,
    ) -> Result<Project> {
        let mut projects = self.projects.lock().unwrap();
        let project = projects
            .get_mut(&project_id)
            .ok_or_else(|| MarketError::NotFound(format!("project {}", project_id)))?;

        if let Some(title) = &fields.title {
            project.title = title.clone();
        }
        if let Some(description) = &fields.description {
            project.description = Some(description.clone());
        }
        if let Some(price_cents) = fields.price_cents {
            project.price_cents = price_cents;
        }
        if let Some(is_free) = fields.is_free {
            project.is_free = is_free;
        }
        if let Some(is_published) = fields.is_published {
            project.is_published = is_published;
        }
        if let Some(source_url) = &fields.source_url {
            project.source_url = Some(source_url.clone());
        }

        debug!("Updated project fields for {}", project_id);
        Ok(project.clone())
    }

    async fn increment_purchase_count(&self, project_id: Uuid) -> Result<()> {
        let mut projects = self.projects.lock().unwrap();
        let project = projects
            .get_mut(&project_id)
            .ok_or_else(|| MarketError::NotFound(format!("project {}", project_id)))?;
        project.purchases += 1;
        Ok(())
    }

    async fn increment_download_count(&self, project_id: Uuid) -> Result<()> {
        let mut projects = self.projects.lock().unwrap();
        let project = projects
            .get_mut(&project_id)
            .ok_or_else(|| MarketError::NotFound(format!("project {}", project_id)))?;
        project.downloads += 1;
        Ok(())
    }

    async fn insert_completed_order(&self, order: &mut Order) -> Result<()> {
        let mut orders = self.orders.lock().unwrap();

        // The ledger is the arbiter: equal keys mean the same purchase, and
        // only one completed row per key may exist at a time.
        if orders
            .values()
            .any(|o| o.idempotency_key == order.idempotency_key && o.status == OrderStatus::Completed)
        {
            return Err(MarketError::AlreadyPurchased);
        }

        let id = Uuid::new_v4();
        order.id = Some(id);
        orders.insert(id, order.clone());

        debug!("Created order: {} with id {}", order.order_number, id);
        Ok(())
    }

    async fn get_order_by_id(&self, order_id: Uuid) -> Result<Option<Order>> {
        let orders = self.orders.lock().unwrap();
        Ok(orders.get(&order_id).cloned())
    }

    async fn get_completed_order(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<Option<Order>> {
        let orders = self.orders.lock().unwrap();
        let order = orders
            .values()
            .filter(|o| {
                o.user_id == user_id && o.project_id == project_id && o.grants_downloads()
            })
            .max_by_key(|o| o.paid_at)
            .cloned();
        Ok(order)
    }

    async fn get_orders_by_user(&self, user_id: &str) -> Result<Vec<Order>> {
        let orders = self.orders.lock().unwrap();
        let mut user_orders: Vec<Order> = orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        user_orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(user_orders)
    }

    async fn set_order_status(&self, order_id: Uuid, status: OrderStatus) -> Result<Order> {
        let mut orders = self.orders.lock().unwrap();

        let (key, current) = orders
            .get(&order_id)
            .map(|o| (o.idempotency_key.clone(), o.status))
            .ok_or_else(|| MarketError::NotFound(format!("order {}", order_id)))?;

        // Transitions into Completed honor the same single-completed-per-key
        // rule as the insert path.
        if status == OrderStatus::Completed
            && current != OrderStatus::Completed
            && orders
                .values()
                .any(|o| o.idempotency_key == key && o.status == OrderStatus::Completed)
        {
            return Err(MarketError::AlreadyPurchased);
        }

        let order = orders.get_mut(&order_id).ok_or_else(|| MarketError::Storage {
            message: format!("order {} vanished during status change", order_id),
        })?;

        order.status = status;
        if status == OrderStatus::Completed && !order.is_paid {
            order.is_paid = true;
            order.paid_at = Some(Utc::now());
        }

        debug!("Order {} moved to status {}", order.order_number, status);
        Ok(order.clone())
    }

    async fn try_consume_download(
        &self,
        user_id: &str,
        project_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<DownloadClaim> {
        let mut orders = self.orders.lock().unwrap();

        let candidate_id = orders
            .values()
            .filter(|o| {
                o.user_id == user_id && o.project_id == project_id && o.grants_downloads()
            })
            .max_by_key(|o| o.paid_at)
            .and_then(|o| o.id);

        let order_id = match candidate_id {
            Some(id) => id,
            None => return Err(MarketError::NotPurchased),
        };

        let order = orders.get_mut(&order_id).ok_or_else(|| MarketError::Storage {
            message: format!("order {} vanished during quota check", order_id),
        })?;

        if !order.has_quota(now) {
            return Err(MarketError::QuotaExceededOrExpired);
        }

        order.download_count += 1;
        let claim = DownloadClaim {
            remaining: order.remaining_downloads(),
            order: order.clone(),
        };

        debug!(
            "Download consumed on order {}: {} remaining",
            claim.order.order_number, claim.remaining
        );
        Ok(claim)
    }

    async fn grant_entitlement(&self, entitlement: &Entitlement) -> Result<bool> {
        let mut entitlements = self.entitlements.lock().unwrap();
        let key = (entitlement.user_id.clone(), entitlement.project_id);
        if entitlements.contains_key(&key) {
            return Ok(false);
        }

        entitlements.insert(key, entitlement.clone());
        debug!(
            "Granted entitlement: user {} project {}",
            entitlement.user_id, entitlement.project_id
        );
        Ok(true)
    }

    async fn has_entitlement(&self, user_id: &str, project_id: Uuid) -> Result<bool> {
        {
            let entitlements = self.entitlements.lock().unwrap();
            if entitlements.contains_key(&(user_id.to_string(), project_id)) {
                return Ok(true);
            }
        }
        // A completed paid order counts even if its entitlement write has
        // not landed yet.
        let order = self.get_completed_order(user_id, project_id).await?;
        Ok(order.is_some())
    }

    async fn get_entitlements_by_user(&self, user_id: &str) -> Result<Vec<Entitlement>> {
        let entitlements = self.entitlements.lock().unwrap();
        let mut user_entitlements: Vec<Entitlement> = entitlements
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        user_entitlements.sort_by(|a, b| b.granted_at.cmp(&a.granted_at));
        Ok(user_entitlements)
    }

    async fn upsert_review(&self, review: &mut Review) -> Result<Project> {
        // Lock order: reviews before projects
        let mut reviews = self.reviews.lock().unwrap();
        let mut projects = self.projects.lock().unwrap();

        let project = projects
            .get_mut(&review.project_id)
            .ok_or_else(|| MarketError::NotFound(format!("project {}", review.project_id)))?;

        let key = (review.user_id.clone(), review.project_id);
        match reviews.get(&key) {
            Some(existing) => {
                review.id = existing.id;
                review.created_at = existing.created_at;
            }
            None => {
                review.id = Some(Uuid::new_v4());
            }
        }
        reviews.insert(key, review.clone());

        let ratings: Vec<f64> = reviews
            .values()
            .filter(|r| r.project_id == review.project_id)
            .map(|r| r.rating as f64)
            .collect();
        project.rating = ratings.iter().sum::<f64>() / ratings.len() as f64;

        debug!(
            "Review upserted for project {}: mean rating now {:.2}",
            review.project_id, project.rating
        );
        Ok(project.clone())
    }

    async fn get_reviews_by_project(&self, project_id: Uuid) -> Result<Vec<Review>> {
        let reviews = self.reviews.lock().unwrap();
        let mut project_reviews: Vec<Review> = reviews
            .values()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect();
        project_reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(project_reviews)
    }
}
