use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use codemart::app::catalog_use_case::CatalogUseCase;
use codemart::app::download_use_case::DownloadUseCase;
use codemart::app::ports::UserDirectory;
use codemart::app::purchase_use_case::{PurchaseOutcome, PurchaseUseCase};
use codemart::app::review_use_case::ReviewUseCase;
use codemart::config::Config;
use codemart::domain::NewProject;
use codemart::infra::{HttpUserDirectory, StaticUserDirectory};
use codemart::logging;
use codemart::observability;
use codemart::server;
use codemart::storage::{InMemoryStorage, Storage};

#[derive(Parser)]
#[command(name = "codemart")]
#[command(about = "Marketplace backend for ready-made software projects")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Port to listen on (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Seed a demo catalog and walk one buyer through the whole flow
    Demo,
}

fn create_user_directory() -> Arc<dyn UserDirectory> {
    match std::env::var("CODEMART_USERS_URL") {
        Ok(url) => {
            info!("Using HTTP user directory at {}", url);
            Arc::new(HttpUserDirectory::new(url))
        }
        Err(_) => {
            info!("Using static user directory");
            Arc::new(StaticUserDirectory::new())
        }
    }
}

async fn run_demo(
    storage: Arc<dyn Storage>,
    users: Arc<dyn UserDirectory>,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🚀 Running storefront demo...");

    let catalog = CatalogUseCase::new(storage.clone());
    let purchase = PurchaseUseCase::new(storage.clone(), users, config.commerce.clone());
    let download = DownloadUseCase::new(storage.clone());
    let review = ReviewUseCase::new(storage.clone());

    println!("\n📦 Step 1: Seeding the catalog...");
    let paid = catalog
        .create_project(NewProject {
            title: "Api Starter".to_string(),
            slug: "api-starter".to_string(),
            description: Some("REST API skeleton with auth and billing".to_string()),
            price_cents: 4900,
            is_free: false,
            is_published: true,
            source_url: Some("https://cdn.codemart.dev/bundles/api-starter.tar.gz".to_string()),
        })
        .await?;
    let free = catalog
        .create_project(NewProject {
            title: "Todo Sample".to_string(),
            slug: "todo-sample".to_string(),
            description: Some("Small starter app for workshops".to_string()),
            price_cents: 0,
            is_free: true,
            is_published: true,
            source_url: Some("https://cdn.codemart.dev/bundles/todo-sample.tar.gz".to_string()),
        })
        .await?;
    println!("   {} at {} cents", paid.title, paid.price_cents);
    println!("   {} for free", free.title);

    let user = "demo-user";
    let paid_id = paid.id.ok_or("project id missing")?;
    let free_id = free.id.ok_or("project id missing")?;

    println!("\n🛒 Step 2: Purchasing {}...", paid.title);
    if let PurchaseOutcome::Purchased { order } = purchase.purchase(user, paid_id).await? {
        println!("   Order {} for {} cents", order.order_number, order.amount_cents);
    }
    purchase.purchase(user, free_id).await?;
    println!("   {} added to the library", free.title);

    println!("\n⬇️ Step 3: Downloading until the quota runs out...");
    loop {
        match download.request_download(user, paid_id).await {
            Ok(grant) => println!("   Download OK, {} remaining", grant.remaining),
            Err(e) => {
                println!("   Denied: {}", e);
                break;
            }
        }
    }

    println!("\n⭐ Step 4: Leaving a review...");
    let rated = review
        .submit_review(user, paid_id, 5, Some("Saved me a weekend".to_string()))
        .await?;
    println!("   Rating is now {:.2}", rated.rating);

    println!("\n✅ Demo complete");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Initialize logging
    logging::init_logging();

    observability::metrics::init().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to initialize metrics: {}", e);
    });

    let cli = Cli::parse();
    let config = Config::load_or_default();

    let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    let users = create_user_directory();

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            server::start_server(storage, users, config.commerce, port).await?;
        }
        Commands::Demo => {
            run_demo(storage, users, config).await?;
        }
    }
    Ok(())
}
