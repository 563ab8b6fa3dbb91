use crate::common::error::Result;
use crate::domain::{Entitlement, Order, OrderStatus, Project, Review, UpdateProjectFields};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Result of an atomic download-quota consumption.
#[derive(Debug, Clone)]
pub struct DownloadClaim {
    /// The order after its counter was bumped
    pub order: Order,
    pub remaining: u32,
}

/// Persistence seam for the catalog, order ledger, entitlement store and
/// reviews. Implementations arbitrate concurrency themselves: callers get
/// no locks, only the guarantees documented per method.
#[async_trait]
pub trait Storage: Send + Sync {
    // Catalog operations
    async fn create_project(&self, project: &mut Project) -> Result<()>;
    async fn get_project_by_id(&self, project_id: Uuid) -> Result<Option<Project>>;
    async fn get_project_by_slug(&self, slug: &str) -> Result<Option<Project>>;
    async fn get_all_projects(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<Project>>;
    async fn update_project_fields(
        &self,
        project_id: Uuid,
        fields: &UpdateProjectFields,
    ) -> Result<Project>;
    /// Counter bumps are approximately-accurate running totals; callers
    /// must never read-modify-write these fields themselves.
    async fn increment_purchase_count(&self, project_id: Uuid) -> Result<()>;
    async fn increment_download_count(&self, project_id: Uuid) -> Result<()>;

    // Order ledger operations
    /// Assigns the id. Fails with `AlreadyPurchased` when a completed order
    /// with the same idempotency key already exists; under concurrent calls
    /// exactly one insert wins.
    async fn insert_completed_order(&self, order: &mut Order) -> Result<()>;
    async fn get_order_by_id(&self, order_id: Uuid) -> Result<Option<Order>>;
    async fn get_completed_order(&self, user_id: &str, project_id: Uuid)
        -> Result<Option<Order>>;
    /// Order history, newest first.
    async fn get_orders_by_user(&self, user_id: &str) -> Result<Vec<Order>>;
    /// Admin transition. Moving into `Completed` fails with
    /// `AlreadyPurchased` while another completed order holds the same key.
    async fn set_order_status(&self, order_id: Uuid, status: OrderStatus) -> Result<Order>;
    /// Looks up the relevant completed, paid order, validates quota and
    /// expiry against `now`, and increments the counter in one step. Two
    /// concurrent calls with one slot left yield exactly one claim.
    async fn try_consume_download(
        &self,
        user_id: &str,
        project_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<DownloadClaim>;

    // Entitlement operations
    /// Set-insert on the (user, project) pair. Returns true when the pair
    /// was newly inserted; repeat grants are no-ops.
    async fn grant_entitlement(&self, entitlement: &Entitlement) -> Result<bool>;
    /// True when the pair is in the entitlement set or a completed paid
    /// order exists for it.
    async fn has_entitlement(&self, user_id: &str, project_id: Uuid) -> Result<bool>;
    async fn get_entitlements_by_user(&self, user_id: &str) -> Result<Vec<Entitlement>>;

    // Review operations
    /// Insert-or-overwrite keyed on (user, project), recomputing the
    /// project's mean rating in the same step. Returns the updated project.
    async fn upsert_review(&self, review: &mut Review) -> Result<Project>;
    async fn get_reviews_by_project(&self, project_id: Uuid) -> Result<Vec<Review>>;
}
