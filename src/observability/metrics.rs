//! Simple metrics module for the codemart commerce system
//!
//! This module provides a straightforward API for recording metrics using
//! the standard Prometheus naming conventions.

use std::fmt;

/// Enum representing all metric names used in the system
/// This eliminates magic strings and provides compile-time safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Purchase metrics
    PurchasesCompleted,
    PurchaseFreeGrants,
    PurchasesRejected,
    PurchaseAmountCents,

    // Download metrics
    DownloadsGranted,
    DownloadsDenied,
    DownloadRemaining,

    // Review metrics
    ReviewsSubmitted,
    ReviewsRejected,
    ReviewRating,

    // Catalog metrics
    CatalogProjectsCreated,
    CatalogProjectsUpdated,
    CatalogOrderStatusChanges,
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            // Purchase metrics
            MetricName::PurchasesCompleted => "codemart_purchases_completed_total",
            MetricName::PurchaseFreeGrants => "codemart_purchase_free_grants_total",
            MetricName::PurchasesRejected => "codemart_purchases_rejected_total",
            MetricName::PurchaseAmountCents => "codemart_purchase_amount_cents",

            // Download metrics
            MetricName::DownloadsGranted => "codemart_downloads_granted_total",
            MetricName::DownloadsDenied => "codemart_downloads_denied_total",
            MetricName::DownloadRemaining => "codemart_download_remaining",

            // Review metrics
            MetricName::ReviewsSubmitted => "codemart_reviews_submitted_total",
            MetricName::ReviewsRejected => "codemart_reviews_rejected_total",
            MetricName::ReviewRating => "codemart_review_rating",

            // Catalog metrics
            MetricName::CatalogProjectsCreated => "codemart_catalog_projects_created_total",
            MetricName::CatalogProjectsUpdated => "codemart_catalog_projects_updated_total",
            MetricName::CatalogOrderStatusChanges => "codemart_catalog_order_status_changes_total",
        };
        write!(f, "{}", name)
    }
}

impl MetricName {
    /// Get the metric name as a string (convenience method)
    pub fn as_str(&self) -> &'static str {
        match self {
            // Purchase metrics
            MetricName::PurchasesCompleted => "codemart_purchases_completed_total",
            MetricName::PurchaseFreeGrants => "codemart_purchase_free_grants_total",
            MetricName::PurchasesRejected => "codemart_purchases_rejected_total",
            MetricName::PurchaseAmountCents => "codemart_purchase_amount_cents",

            // Download metrics
            MetricName::DownloadsGranted => "codemart_downloads_granted_total",
            MetricName::DownloadsDenied => "codemart_downloads_denied_total",
            MetricName::DownloadRemaining => "codemart_download_remaining",

            // Review metrics
            MetricName::ReviewsSubmitted => "codemart_reviews_submitted_total",
            MetricName::ReviewsRejected => "codemart_reviews_rejected_total",
            MetricName::ReviewRating => "codemart_review_rating",

            // Catalog metrics
            MetricName::CatalogProjectsCreated => "codemart_catalog_projects_created_total",
            MetricName::CatalogProjectsUpdated => "codemart_catalog_projects_updated_total",
            MetricName::CatalogOrderStatusChanges => "codemart_catalog_order_status_changes_total",
        }
    }

    /// Get all metric names as an iterator (for registration and tests)
    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            // Purchase metrics
            PurchasesCompleted,
            PurchaseFreeGrants,
            PurchasesRejected,
            PurchaseAmountCents,

            // Download metrics
            DownloadsGranted,
            DownloadsDenied,
            DownloadRemaining,

            // Review metrics
            ReviewsSubmitted,
            ReviewsRejected,
            ReviewRating,

            // Catalog metrics
            CatalogProjectsCreated,
            CatalogProjectsUpdated,
            CatalogOrderStatusChanges,
        ]
        .into_iter()
    }

    /// Get metric metadata for registration
    pub fn metadata(&self) -> (&'static str, &'static str, Option<&'static str>) {
        // Returns (phase, description, unit)
        match self {
            // Purchase metrics
            MetricName::PurchasesCompleted => ("purchase", "Paid purchases completed", None),
            MetricName::PurchaseFreeGrants => ("purchase", "Free projects granted", None),
            MetricName::PurchasesRejected => ("purchase", "Purchases rejected by reason", None),
            MetricName::PurchaseAmountCents => ("purchase", "Order amount distribution", Some("cents")),

            // Download metrics
            MetricName::DownloadsGranted => ("download", "Downloads granted", None),
            MetricName::DownloadsDenied => ("download", "Downloads denied by reason", None),
            MetricName::DownloadRemaining => ("download", "Remaining quota at grant time", None),

            // Review metrics
            MetricName::ReviewsSubmitted => ("review", "Reviews accepted", None),
            MetricName::ReviewsRejected => ("review", "Reviews rejected by reason", None),
            MetricName::ReviewRating => ("review", "Submitted rating distribution", None),

            // Catalog metrics
            MetricName::CatalogProjectsCreated => ("catalog", "Projects created", None),
            MetricName::CatalogProjectsUpdated => ("catalog", "Projects updated", None),
            MetricName::CatalogOrderStatusChanges => ("catalog", "Order status corrections by status", None),
        }
    }

    /// Infer metric type from the Prometheus naming convention
    pub fn is_counter(&self) -> bool {
        self.as_str().ends_with("_total")
    }
}

use std::sync::OnceLock;
use tracing::info;

// Global handle so the HTTP layer can render the scrape text
static METRICS_HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();

/// Initialize the metrics system and register descriptions
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();

    // Install the recorder and keep the handle for rendering
    let handle = builder
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    METRICS_HANDLE.set(handle).ok();

    for metric in MetricName::all_metrics() {
        let (_, description, _) = metric.metadata();
        if metric.is_counter() {
            ::metrics::describe_counter!(metric.as_str(), description);
        } else {
            ::metrics::describe_histogram!(metric.as_str(), description);
        }
    }

    info!("Metrics system initialized");
    Ok(())
}

/// Render the current metrics in Prometheus exposition format
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

// ============================================================================
// Purchase Metrics
// ============================================================================

pub mod purchase {
    use super::MetricName;

    /// Record a completed paid purchase
    pub fn completed(amount_cents: i64) {
        ::metrics::counter!(MetricName::PurchasesCompleted.as_str()).increment(1);
        ::metrics::histogram!(MetricName::PurchaseAmountCents.as_str()).record(amount_cents as f64);
    }

    /// Record a free grant
    pub fn free_grant() {
        ::metrics::counter!(MetricName::PurchaseFreeGrants.as_str()).increment(1);
    }

    /// Record a rejected purchase
    pub fn rejected(reason: &str) {
        ::metrics::counter!(MetricName::PurchasesRejected.as_str(), "reason" => reason.to_string())
            .increment(1);
    }
}

// ============================================================================
// Download Metrics
// ============================================================================

pub mod download {
    use super::MetricName;

    /// Record a granted download and the quota left afterwards
    pub fn granted(remaining: u32) {
        ::metrics::counter!(MetricName::DownloadsGranted.as_str()).increment(1);
        ::metrics::histogram!(MetricName::DownloadRemaining.as_str()).record(remaining as f64);
    }

    /// Record a denied download
    pub fn denied(reason: &str) {
        ::metrics::counter!(MetricName::DownloadsDenied.as_str(), "reason" => reason.to_string())
            .increment(1);
    }
}

// ============================================================================
// Review Metrics
// ============================================================================

pub mod review {
    use super::MetricName;

    /// Record an accepted review
    pub fn submitted(rating: u8) {
        ::metrics::counter!(MetricName::ReviewsSubmitted.as_str()).increment(1);
        ::metrics::histogram!(MetricName::ReviewRating.as_str()).record(rating as f64);
    }

    /// Record a rejected review
    pub fn rejected(reason: &str) {
        ::metrics::counter!(MetricName::ReviewsRejected.as_str(), "reason" => reason.to_string())
            .increment(1);
    }
}

// ============================================================================
// Catalog Metrics
// ============================================================================

pub mod catalog {
    use super::MetricName;

    /// Record a created project
    pub fn project_created() {
        ::metrics::counter!(MetricName::CatalogProjectsCreated.as_str()).increment(1);
    }

    /// Record an updated project
    pub fn project_updated() {
        ::metrics::counter!(MetricName::CatalogProjectsUpdated.as_str()).increment(1);
    }

    /// Record an order status correction
    pub fn order_status_changed(status: &str) {
        ::metrics::counter!(
            MetricName::CatalogOrderStatusChanges.as_str(),
            "status" => status.to_string()
        )
        .increment(1);
    }
}
