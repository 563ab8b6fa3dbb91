use crate::app::ports::UserDirectory;
use crate::app::{
    catalog_use_case::CatalogUseCase, download_use_case::DownloadUseCase,
    purchase_use_case::PurchaseOutcome, purchase_use_case::PurchaseUseCase,
    review_use_case::ReviewUseCase,
};
use crate::common::error::MarketError;
use crate::config::CommerceConfig;
use crate::domain::{NewProject, Order, OrderStatus, Project, UpdateProjectFields};
use crate::storage::Storage;
use axum::{
    extract::Path,
    http::Method,
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Extension, Json as AxumJson, Router,
};
use hyper::Server;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

// GraphQL imports
use crate::graphql::{
    resolvers::Query,
    schema::{GraphQLContext, GraphQLSchema},
};
use async_graphql::{http::graphiql_source, EmptyMutation, EmptySubscription, Schema};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};

#[derive(Debug, Deserialize)]
pub struct PurchaseParams {
    pub user_id: String,
    pub project_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct PurchaseResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_free: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    pub user_id: String,
    pub project_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct DownloadResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewParams {
    pub user_id: String,
    pub project_id: Uuid,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<Project>,
}

#[derive(Debug, Deserialize)]
pub struct SetOrderStatusParams {
    pub status: OrderStatus,
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "codemart",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GraphQL handler (supports GET and POST)
async fn graphql_handler(
    Extension(schema): Extension<GraphQLSchema>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

/// GraphiQL UI
async fn graphiql() -> impl IntoResponse {
    Html(graphiql_source("/graphql", None))
}

/// Prometheus scrape endpoint
async fn metrics_text() -> impl IntoResponse {
    match crate::observability::metrics::render() {
        Some(body) => (StatusCode::OK, body).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        )
            .into_response(),
    }
}

/// Map admin endpoint failures onto HTTP statuses
fn admin_error(e: MarketError) -> axum::response::Response {
    let status = match &e {
        MarketError::NotFound(_) => StatusCode::NOT_FOUND,
        _ if e.is_expected() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string()).into_response()
}

/// Create the HTTP server with all routes, including GraphQL
pub fn create_server(
    storage: Arc<dyn Storage>,
    users: Arc<dyn UserDirectory>,
    commerce: CommerceConfig,
) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    // Build GraphQL schema and attach storage in context
    let schema: GraphQLSchema = Schema::build(Query, EmptyMutation, EmptySubscription)
        .data(GraphQLContext {
            storage: storage.clone(),
        })
        .finish();

    let purchase_uc = Arc::new(PurchaseUseCase::new(
        storage.clone(),
        users,
        commerce.clone(),
    ));
    let download_uc = Arc::new(DownloadUseCase::new(storage.clone()));
    let review_uc = Arc::new(ReviewUseCase::new(storage.clone()));
    let catalog_uc = Arc::new(CatalogUseCase::new(storage.clone()));

    Router::new()
        .route("/health", get(health))
        // GraphQL endpoints
        .route("/graphql", post(graphql_handler).get(graphql_handler))
        .route("/graphiql", get(graphiql))
        .layer(Extension(schema))
        .route("/metrics", get(metrics_text))
        // Storefront endpoints
        .route(
            "/purchase",
            post({
                let uc = purchase_uc.clone();
                move |AxumJson(p): AxumJson<PurchaseParams>| {
                    let uc = uc.clone();
                    async move {
                        match uc.purchase(&p.user_id, p.project_id).await {
                            Ok(PurchaseOutcome::Purchased { order }) => AxumJson(PurchaseResult {
                                success: true,
                                message: format!("Purchase completed: {}", order.order_number),
                                is_free: None,
                                order: Some(order),
                            })
                            .into_response(),
                            Ok(PurchaseOutcome::FreeGranted { newly_granted }) => {
                                let message = if newly_granted {
                                    "Free project added to your library".to_string()
                                } else {
                                    "Free project was already in your library".to_string()
                                };
                                AxumJson(PurchaseResult {
                                    success: true,
                                    message,
                                    is_free: Some(true),
                                    order: None,
                                })
                                .into_response()
                            }
                            Err(e) if e.is_expected() => AxumJson(PurchaseResult {
                                success: false,
                                message: e.to_string(),
                                is_free: None,
                                order: None,
                            })
                            .into_response(),
                            Err(e) => {
                                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
                            }
                        }
                    }
                }
            }),
        )
        .route(
            "/download",
            post({
                let uc = download_uc.clone();
                move |AxumJson(p): AxumJson<DownloadParams>| {
                    let uc = uc.clone();
                    async move {
                        match uc.request_download(&p.user_id, p.project_id).await {
                            Ok(grant) => AxumJson(DownloadResult {
                                success: true,
                                message: format!("{} downloads remaining", grant.remaining),
                                download_url: Some(grant.download_url),
                                remaining: Some(grant.remaining),
                                order_number: Some(grant.order_number),
                            })
                            .into_response(),
                            Err(e) if e.is_expected() => AxumJson(DownloadResult {
                                success: false,
                                message: e.to_string(),
                                download_url: None,
                                remaining: None,
                                order_number: None,
                            })
                            .into_response(),
                            Err(e) => {
                                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
                            }
                        }
                    }
                }
            }),
        )
        .route(
            "/review",
            post({
                let uc = review_uc.clone();
                move |AxumJson(p): AxumJson<ReviewParams>| {
                    let uc = uc.clone();
                    async move {
                        match uc
                            .submit_review(&p.user_id, p.project_id, p.rating, p.comment)
                            .await
                        {
                            Ok(project) => AxumJson(ReviewResult {
                                success: true,
                                message: format!("Project rating is now {:.2}", project.rating),
                                project: Some(project),
                            })
                            .into_response(),
                            Err(e) if e.is_expected() => AxumJson(ReviewResult {
                                success: false,
                                message: e.to_string(),
                                project: None,
                            })
                            .into_response(),
                            Err(e) => {
                                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
                            }
                        }
                    }
                }
            }),
        )
        // Admin endpoints
        .route(
            "/admin/projects",
            post({
                let uc = catalog_uc.clone();
                move |AxumJson(p): AxumJson<NewProject>| {
                    let uc = uc.clone();
                    async move {
                        match uc.create_project(p).await {
                            Ok(project) => AxumJson(project).into_response(),
                            Err(e) => admin_error(e),
                        }
                    }
                }
            }),
        )
        .route(
            "/admin/projects/:id",
            post({
                let uc = catalog_uc.clone();
                move |Path(id): Path<Uuid>, AxumJson(p): AxumJson<UpdateProjectFields>| {
                    let uc = uc.clone();
                    async move {
                        match uc.update_project(id, p).await {
                            Ok(project) => AxumJson(project).into_response(),
                            Err(e) => admin_error(e),
                        }
                    }
                }
            }),
        )
        .route(
            "/admin/orders/:id/status",
            post({
                let uc = catalog_uc.clone();
                move |Path(id): Path<Uuid>, AxumJson(p): AxumJson<SetOrderStatusParams>| {
                    let uc = uc.clone();
                    async move {
                        match uc.set_order_status(id, p.status).await {
                            Ok(order) => AxumJson(order).into_response(),
                            Err(e) => admin_error(e),
                        }
                    }
                }
            }),
        )
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified port
pub async fn start_server(
    storage: Arc<dyn Storage>,
    users: Arc<dyn UserDirectory>,
    commerce: CommerceConfig,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_server(storage, users, commerce);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    println!("🚀 HTTP server running on http://localhost:{port}");
    println!("💚 Health check: http://localhost:{port}/health");
    println!("🔎 GraphQL:      http://localhost:{port}/graphql");
    println!("🧪 GraphiQL UI:  http://localhost:{port}/graphiql");
    println!("📈 Metrics:      http://localhost:{port}/metrics");

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
