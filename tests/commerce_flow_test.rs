use anyhow::Result;
use codemart::app::catalog_use_case::CatalogUseCase;
use codemart::app::download_use_case::DownloadUseCase;
use codemart::app::ports::UserDirectory;
use codemart::app::purchase_use_case::{PurchaseOutcome, PurchaseUseCase};
use codemart::app::review_use_case::ReviewUseCase;
use codemart::common::error::MarketError;
use codemart::config::CommerceConfig;
use codemart::domain::{NewProject, OrderStatus};
use codemart::infra::StaticUserDirectory;
use codemart::storage::{InMemoryStorage, Storage};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

struct Market {
    storage: Arc<InMemoryStorage>,
    catalog: CatalogUseCase,
    purchase: PurchaseUseCase,
    download: DownloadUseCase,
    review: ReviewUseCase,
}

fn market_with(commerce: CommerceConfig) -> Market {
    let storage = Arc::new(InMemoryStorage::new());
    let users: Arc<dyn UserDirectory> = Arc::new(StaticUserDirectory::new());
    Market {
        catalog: CatalogUseCase::new(storage.clone()),
        purchase: PurchaseUseCase::new(storage.clone(), users, commerce),
        download: DownloadUseCase::new(storage.clone()),
        review: ReviewUseCase::new(storage.clone()),
        storage,
    }
}

async fn seed_paid_project(market: &Market, price_cents: i64) -> Result<Uuid> {
    let project = market
        .catalog
        .create_project(NewProject {
            title: "Api Starter".to_string(),
            slug: "api-starter".to_string(),
            description: Some("REST API skeleton with auth".to_string()),
            price_cents,
            is_free: false,
            is_published: true,
            source_url: Some("https://cdn.codemart.dev/bundles/api-starter.tar.gz".to_string()),
        })
        .await?;
    Ok(project.id.unwrap())
}

#[tokio::test]
async fn test_paid_purchase_download_and_review_flow() -> Result<()> {
    let market = market_with(CommerceConfig {
        max_downloads: 2,
        entitlement_days: 365,
    });
    let project_id = seed_paid_project(&market, 100).await?;

    // Purchase settles immediately and opens the download window
    let outcome = market.purchase.purchase("buyer-1", project_id).await?;
    let order = match outcome {
        PurchaseOutcome::Purchased { order } => order,
        other => panic!("expected a paid order, got {:?}", other),
    };
    assert_eq!(order.amount_cents, 100);
    assert!(order.order_number.starts_with("ORD-"));
    assert_eq!(order.max_downloads, 2);
    assert!(order.is_paid);

    // Buying the same project again is rejected
    let err = market
        .purchase
        .purchase("buyer-1", project_id)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::AlreadyPurchased));

    // Quota runs down to zero, then the gate closes
    let first = market.download.request_download("buyer-1", project_id).await?;
    assert_eq!(first.remaining, 1);
    assert!(first.download_url.contains("api-starter"));
    let second = market.download.request_download("buyer-1", project_id).await?;
    assert_eq!(second.remaining, 0);
    let err = market
        .download
        .request_download("buyer-1", project_id)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::QuotaExceededOrExpired));

    // The buyer can now rate the project
    let rated = market
        .review
        .submit_review("buyer-1", project_id, 5, Some("Solid".to_string()))
        .await?;
    assert!((rated.rating - 5.0).abs() < f64::EPSILON);

    // Catalog counters and the ledger line up
    let project = market.storage.get_project_by_id(project_id).await?.unwrap();
    assert_eq!(project.purchases, 1);
    assert_eq!(project.downloads, 2);
    let history = market.storage.get_orders_by_user("buyer-1").await?;
    assert_eq!(history.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_free_projects_grant_without_orders() -> Result<()> {
    let market = market_with(CommerceConfig::default());
    let project = market
        .catalog
        .create_project(NewProject {
            title: "Todo Sample".to_string(),
            slug: "todo-sample".to_string(),
            description: None,
            price_cents: 0,
            is_free: true,
            is_published: true,
            source_url: Some("https://cdn.codemart.dev/bundles/todo-sample.tar.gz".to_string()),
        })
        .await?;
    let project_id = project.id.unwrap();

    // Repeat acquisitions stay idempotent
    for round in 0..3 {
        let outcome = market.purchase.purchase("reader-1", project_id).await?;
        match outcome {
            PurchaseOutcome::FreeGranted { newly_granted } => {
                assert_eq!(newly_granted, round == 0)
            }
            other => panic!("expected a free grant, got {:?}", other),
        }
    }

    // No ledger entries and no download quota to spend
    assert!(market.storage.get_orders_by_user("reader-1").await?.is_empty());
    let err = market
        .download
        .request_download("reader-1", project_id)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::NotPurchased));

    // The grant still counts as an entitlement, so reviewing works
    let rated = market
        .review
        .submit_review("reader-1", project_id, 4, None)
        .await?;
    assert!((rated.rating - 4.0).abs() < f64::EPSILON);

    let entitlements = market.storage.get_entitlements_by_user("reader-1").await?;
    assert_eq!(entitlements.len(), 1);
    assert!(entitlements[0].via_order.is_none());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_purchases_have_single_winner() -> Result<()> {
    let market = market_with(CommerceConfig::default());
    let project_id = seed_paid_project(&market, 4900).await?;
    let purchase = Arc::new(market.purchase);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let purchase = purchase.clone();
        handles.push(tokio::spawn(async move {
            purchase.purchase("buyer-1", project_id).await
        }));
    }

    let mut wins = 0;
    let mut rejections = 0;
    for handle in handles {
        match handle.await? {
            Ok(PurchaseOutcome::Purchased { .. }) => wins += 1,
            Err(MarketError::AlreadyPurchased) => rejections += 1,
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(rejections, 7);

    let history = market.storage.get_orders_by_user("buyer-1").await?;
    assert_eq!(history.len(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_downloads_cannot_oversubscribe() -> Result<()> {
    let market = market_with(CommerceConfig {
        max_downloads: 1,
        entitlement_days: 365,
    });
    let project_id = seed_paid_project(&market, 4900).await?;
    market.purchase.purchase("buyer-1", project_id).await?;
    let download = Arc::new(market.download);

    let mut handles = Vec::new();
    for _ in 0..2 {
        let download = download.clone();
        handles.push(tokio::spawn(async move {
            download.request_download("buyer-1", project_id).await
        }));
    }

    let mut grants = 0;
    let mut denials = 0;
    for handle in handles {
        match handle.await? {
            Ok(grant) => {
                assert_eq!(grant.remaining, 0);
                grants += 1;
            }
            Err(MarketError::QuotaExceededOrExpired) => denials += 1,
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }
    assert_eq!(grants, 1);
    assert_eq!(denials, 1);

    let order = market
        .storage
        .get_completed_order("buyer-1", project_id)
        .await?
        .unwrap();
    assert_eq!(order.download_count, 1);
    Ok(())
}

#[tokio::test]
async fn test_refund_revokes_downloads_and_frees_the_pair() -> Result<()> {
    let market = market_with(CommerceConfig::default());
    let project_id = seed_paid_project(&market, 4900).await?;

    let order = match market.purchase.purchase("buyer-1", project_id).await? {
        PurchaseOutcome::Purchased { order } => order,
        other => panic!("expected a paid order, got {:?}", other),
    };
    market.download.request_download("buyer-1", project_id).await?;

    // Refund closes the gate even with quota left
    market
        .catalog
        .set_order_status(order.id.unwrap(), OrderStatus::Refunded)
        .await?;
    let err = market
        .download
        .request_download("buyer-1", project_id)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::NotPurchased));

    // The pair is free again; the second order starts a fresh quota
    tokio::time::sleep(Duration::from_millis(5)).await;
    let reorder = match market.purchase.purchase("buyer-1", project_id).await? {
        PurchaseOutcome::Purchased { order } => order,
        other => panic!("expected a paid order, got {:?}", other),
    };
    assert_ne!(reorder.id, order.id);
    let grant = market.download.request_download("buyer-1", project_id).await?;
    assert_eq!(grant.remaining, reorder.max_downloads - 1);
    assert_eq!(grant.order_number, reorder.order_number);

    // History lists both orders, newest first
    let history = market.storage.get_orders_by_user("buyer-1").await?;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, reorder.id);
    assert_eq!(history[1].status, OrderStatus::Refunded);
    Ok(())
}

#[tokio::test]
async fn test_graphql_surface_reads_the_catalog() -> Result<()> {
    let market = market_with(CommerceConfig::default());
    let project_id = seed_paid_project(&market, 4900).await?;
    market.purchase.purchase("buyer-1", project_id).await?;
    market
        .review
        .submit_review("buyer-1", project_id, 4, Some("Works".to_string()))
        .await?;

    let schema = codemart::graphql::create_schema(market.storage.clone());

    let response = schema
        .execute("{ projects { title slug rating purchases } }")
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let data = response.data.into_json()?;
    assert_eq!(data["projects"][0]["title"], "Api Starter");
    assert_eq!(data["projects"][0]["slug"], "api-starter");
    assert_eq!(data["projects"][0]["purchases"], 1);

    let response = schema
        .execute(r#"{ ordersByUser(userId: "buyer-1") { orderNumber status remainingDownloads } }"#)
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let data = response.data.into_json()?;
    assert_eq!(data["ordersByUser"][0]["status"], "completed");

    let response = schema
        .execute(format!(
            r#"{{ reviewsByProject(projectId: "{}") {{ rating comment }} }}"#,
            project_id
        ))
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let data = response.data.into_json()?;
    assert_eq!(data["reviewsByProject"][0]["rating"], 4);
    assert_eq!(data["reviewsByProject"][0]["comment"], "Works");
    Ok(())
}
