use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A ready-made software project listed in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Option<Uuid>,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    /// Money is integer cents; no floats in billing paths
    pub price_cents: i64,
    pub is_free: bool,
    pub is_published: bool,
    /// Where the purchased artifact lives (archive or repository URL)
    pub source_url: Option<String>,
    /// Running counters, maintained by storage increments only
    pub purchases: u64,
    pub downloads: u64,
    /// Arithmetic mean of review ratings, 0.0 when unreviewed
    pub rating: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
            OrderStatus::Refunded => "refunded",
        };
        write!(f, "{}", s)
    }
}

/// Ledger record of a paid acquisition. Free grants never create orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Option<Uuid>,
    pub order_number: String,
    /// Derived from the (user, project) pair; the ledger's uniqueness key
    pub idempotency_key: String,
    pub user_id: String,
    pub project_id: Uuid,
    pub amount_cents: i64,
    pub status: OrderStatus,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub download_count: u32,
    pub max_downloads: u32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Orders grant downloads only while completed and paid.
    pub fn grants_downloads(&self) -> bool {
        self.status == OrderStatus::Completed && self.is_paid
    }

    /// Quota still open relative to the given instant.
    pub fn has_quota(&self, now: DateTime<Utc>) -> bool {
        self.download_count < self.max_downloads && self.expires_at > now
    }

    pub fn remaining_downloads(&self) -> u32 {
        self.max_downloads.saturating_sub(self.download_count)
    }
}

/// Durable right of a user to a project. Keyed on the (user, project) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entitlement {
    pub user_id: String,
    pub project_id: Uuid,
    /// None for free grants
    pub via_order: Option<Uuid>,
    pub granted_at: DateTime<Utc>,
}

/// One review per (user, project); resubmission overwrites in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Option<Uuid>,
    pub user_id: String,
    pub project_id: Uuid,
    /// 1 through 5
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin input for creating a catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProject {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub source_url: Option<String>,
}

/// Partial catalog update with named fields only. Absent fields are left
/// untouched; the slug is immutable after creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectFields {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub is_free: Option<bool>,
    #[serde(default)]
    pub is_published: Option<bool>,
    #[serde(default)]
    pub source_url: Option<String>,
}
