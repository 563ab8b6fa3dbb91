use crate::app::ports::UserDirectory;
use crate::common::error::{MarketError, Result};
use crate::config::CommerceConfig;
use crate::domain::{Entitlement, Order, OrderStatus};
use crate::idempotency;
use crate::observability::metrics;
use crate::storage::Storage;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Outcome of a purchase request.
#[derive(Debug, Clone)]
pub enum PurchaseOutcome {
    /// Free project: entitlement granted (or already present), no order
    FreeGranted { newly_granted: bool },
    /// Paid project: completed order recorded in the ledger
    Purchased { order: Order },
}

/// Use case for acquiring a project, either as a free grant or a paid
/// checkout against the order ledger.
pub struct PurchaseUseCase {
    storage: Arc<dyn Storage>,
    users: Arc<dyn UserDirectory>,
    commerce: CommerceConfig,
}

impl PurchaseUseCase {
    pub fn new(
        storage: Arc<dyn Storage>,
        users: Arc<dyn UserDirectory>,
        commerce: CommerceConfig,
    ) -> Self {
        Self {
            storage,
            users,
            commerce,
        }
    }

    pub async fn purchase(&self, user_id: &str, project_id: Uuid) -> Result<PurchaseOutcome> {
        let outcome = self.run(user_id, project_id).await;
        match &outcome {
            Ok(PurchaseOutcome::FreeGranted { .. }) => metrics::purchase::free_grant(),
            Ok(PurchaseOutcome::Purchased { order }) => {
                metrics::purchase::completed(order.amount_cents)
            }
            Err(e) if e.is_expected() => metrics::purchase::rejected(e.label()),
            Err(_) => {}
        }
        outcome
    }

    async fn run(&self, user_id: &str, project_id: Uuid) -> Result<PurchaseOutcome> {
        // Upstream auth already vets the account; re-check cheaply and fail
        // open when the directory itself is unreachable.
        match self.users.is_active(user_id).await {
            Ok(true) => {}
            Ok(false) => return Err(MarketError::InactiveUser),
            Err(e) => warn!("User directory check failed for {}: {}", user_id, e),
        }

        let project = self
            .storage
            .get_project_by_id(project_id)
            .await?
            .filter(|p| p.is_published)
            .ok_or_else(|| MarketError::NotFound(format!("project {}", project_id)))?;

        if project.is_free {
            let entitlement = Entitlement {
                user_id: user_id.to_string(),
                project_id,
                via_order: None,
                granted_at: Utc::now(),
            };
            let newly_granted = self.storage.grant_entitlement(&entitlement).await?;
            if newly_granted {
                info!(
                    "Free entitlement granted: user {} project {}",
                    user_id, project_id
                );
            }
            return Ok(PurchaseOutcome::FreeGranted { newly_granted });
        }

        // Fast path only; the ledger's uniqueness key stays the authority
        // when two requests race past this check.
        if self
            .storage
            .get_completed_order(user_id, project_id)
            .await?
            .is_some()
        {
            return Err(MarketError::AlreadyPurchased);
        }

        let now = Utc::now();
        let mut order = Order {
            id: None,
            order_number: idempotency::new_order_number(now),
            idempotency_key: idempotency::purchase_key(user_id, project_id),
            user_id: user_id.to_string(),
            project_id,
            amount_cents: project.price_cents,
            status: OrderStatus::Completed,
            is_paid: true,
            paid_at: Some(now),
            download_count: 0,
            max_downloads: self.commerce.max_downloads,
            expires_at: now + Duration::days(self.commerce.entitlement_days),
            created_at: now,
        };
        self.storage.insert_completed_order(&mut order).await?;

        // Entitlement insert is idempotent, so a retry after a partial
        // failure converges instead of duplicating state.
        let entitlement = Entitlement {
            user_id: user_id.to_string(),
            project_id,
            via_order: order.id,
            granted_at: now,
        };
        self.storage.grant_entitlement(&entitlement).await?;

        if let Err(e) = self.storage.increment_purchase_count(project_id).await {
            warn!("Purchase counter bump failed for {}: {}", project_id, e);
        }

        info!(
            "Purchase completed: order {} user {} project {} amount {}",
            order.order_number, user_id, project_id, order.amount_cents
        );
        Ok(PurchaseOutcome::Purchased { order })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Project;
    use crate::storage::InMemoryStorage;
    use async_trait::async_trait;
    use std::collections::HashSet;

    struct MockDirectory {
        deactivated: HashSet<String>,
        failing: bool,
    }

    impl MockDirectory {
        fn allow_all() -> Self {
            Self {
                deactivated: HashSet::new(),
                failing: false,
            }
        }

        fn with_deactivated(user_id: &str) -> Self {
            let mut deactivated = HashSet::new();
            deactivated.insert(user_id.to_string());
            Self {
                deactivated,
                failing: false,
            }
        }

        fn offline() -> Self {
            Self {
                deactivated: HashSet::new(),
                failing: true,
            }
        }
    }

    #[async_trait]
    impl UserDirectory for MockDirectory {
        async fn is_active(&self, user_id: &str) -> std::result::Result<bool, String> {
            if self.failing {
                return Err("directory offline".to_string());
            }
            Ok(!self.deactivated.contains(user_id))
        }
    }

    async fn seed_project(
        storage: &InMemoryStorage,
        slug: &str,
        price_cents: i64,
        is_free: bool,
        is_published: bool,
    ) -> Uuid {
        let mut project = Project {
            id: None,
            title: slug.to_string(),
            slug: slug.to_string(),
            description: None,
            price_cents,
            is_free,
            is_published,
            source_url: Some("https://cdn.codemart.dev/bundles/kit.tar.gz".to_string()),
            purchases: 0,
            downloads: 0,
            rating: 0.0,
            created_at: Utc::now(),
        };
        storage.create_project(&mut project).await.unwrap();
        project.id.unwrap()
    }

    fn use_case(storage: Arc<InMemoryStorage>, users: MockDirectory) -> PurchaseUseCase {
        PurchaseUseCase::new(storage, Arc::new(users), CommerceConfig::default())
    }

    #[tokio::test]
    async fn test_paid_purchase_creates_completed_order() {
        let storage = Arc::new(InMemoryStorage::new());
        let project_id = seed_project(&storage, "api-starter", 100, false, true).await;
        let use_case = use_case(storage.clone(), MockDirectory::allow_all());

        let before = Utc::now();
        let outcome = use_case.purchase("user-1", project_id).await.unwrap();
        let order = match outcome {
            PurchaseOutcome::Purchased { order } => order,
            other => panic!("expected a paid purchase, got {:?}", other),
        };

        assert_eq!(order.amount_cents, 100);
        assert_eq!(order.status, OrderStatus::Completed);
        assert!(order.is_paid);
        assert!(order.paid_at.is_some());
        assert_eq!(order.download_count, 0);
        assert_eq!(order.max_downloads, 5);
        assert!(order.order_number.starts_with("ORD-"));
        assert!(order.expires_at > before + Duration::days(364));

        let project = storage.get_project_by_id(project_id).await.unwrap().unwrap();
        assert_eq!(project.purchases, 1);
        assert!(storage.has_entitlement("user-1", project_id).await.unwrap());
        assert_eq!(storage.get_orders_by_user("user-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_double_purchase_is_rejected() {
        let storage = Arc::new(InMemoryStorage::new());
        let project_id = seed_project(&storage, "api-starter", 100, false, true).await;
        let use_case = use_case(storage.clone(), MockDirectory::allow_all());

        use_case.purchase("user-1", project_id).await.unwrap();
        let err = use_case.purchase("user-1", project_id).await.unwrap_err();
        assert!(matches!(err, MarketError::AlreadyPurchased));

        assert_eq!(storage.get_orders_by_user("user-1").await.unwrap().len(), 1);
        let project = storage.get_project_by_id(project_id).await.unwrap().unwrap();
        assert_eq!(project.purchases, 1);
    }

    #[tokio::test]
    async fn test_free_purchase_is_idempotent_with_zero_orders() {
        let storage = Arc::new(InMemoryStorage::new());
        let project_id = seed_project(&storage, "cli-template", 0, true, true).await;
        let use_case = use_case(storage.clone(), MockDirectory::allow_all());

        for attempt in 0..3 {
            let outcome = use_case.purchase("user-1", project_id).await.unwrap();
            match outcome {
                PurchaseOutcome::FreeGranted { newly_granted } => {
                    assert_eq!(newly_granted, attempt == 0)
                }
                other => panic!("expected a free grant, got {:?}", other),
            }
        }

        assert_eq!(
            storage.get_entitlements_by_user("user-1").await.unwrap().len(),
            1
        );
        assert!(storage.get_orders_by_user("user-1").await.unwrap().is_empty());
        let project = storage.get_project_by_id(project_id).await.unwrap().unwrap();
        assert_eq!(project.purchases, 0);
    }

    #[tokio::test]
    async fn test_unpublished_project_is_not_found() {
        let storage = Arc::new(InMemoryStorage::new());
        let project_id = seed_project(&storage, "draft-kit", 100, false, false).await;
        let use_case = use_case(storage.clone(), MockDirectory::allow_all());

        let err = use_case.purchase("user-1", project_id).await.unwrap_err();
        assert!(matches!(err, MarketError::NotFound(_)));
        assert!(storage.get_orders_by_user("user-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_project_is_not_found() {
        let storage = Arc::new(InMemoryStorage::new());
        let use_case = use_case(storage, MockDirectory::allow_all());

        let err = use_case.purchase("user-1", Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, MarketError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_deactivated_user_is_rejected() {
        let storage = Arc::new(InMemoryStorage::new());
        let project_id = seed_project(&storage, "api-starter", 100, false, true).await;
        let use_case = use_case(storage.clone(), MockDirectory::with_deactivated("user-1"));

        let err = use_case.purchase("user-1", project_id).await.unwrap_err();
        assert!(matches!(err, MarketError::InactiveUser));
        assert!(storage.get_orders_by_user("user-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_directory_outage_fails_open() {
        let storage = Arc::new(InMemoryStorage::new());
        let project_id = seed_project(&storage, "api-starter", 100, false, true).await;
        let use_case = use_case(storage, MockDirectory::offline());

        let outcome = use_case.purchase("user-1", project_id).await.unwrap();
        assert!(matches!(outcome, PurchaseOutcome::Purchased { .. }));
    }
}
