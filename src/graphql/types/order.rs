use crate::domain::Order as DomainOrder;
use crate::graphql::schema::GraphQLContext;
use async_graphql::{Context, FieldResult, Object, ID};

/// GraphQL representation of an Order
#[derive(Clone)]
pub struct Order {
    pub inner: DomainOrder,
}

impl From<DomainOrder> for Order {
    fn from(order: DomainOrder) -> Self {
        Self { inner: order }
    }
}

#[Object]
impl Order {
    /// The unique identifier for the order
    async fn id(&self) -> ID {
        ID(self.inner.id.unwrap_or_default().to_string())
    }

    /// Human-readable order number
    async fn order_number(&self) -> &str {
        &self.inner.order_number
    }

    /// The buyer
    async fn user_id(&self) -> &str {
        &self.inner.user_id
    }

    /// The purchased project
    async fn project_id(&self) -> ID {
        ID(self.inner.project_id.to_string())
    }

    /// Amount charged in integer cents
    async fn amount_cents(&self) -> i64 {
        self.inner.amount_cents
    }

    /// Order status
    async fn status(&self) -> String {
        self.inner.status.to_string()
    }

    /// Whether the payment settled
    async fn is_paid(&self) -> bool {
        self.inner.is_paid
    }

    /// When the payment settled
    async fn paid_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.inner.paid_at
    }

    /// Downloads served against this order
    async fn download_count(&self) -> u32 {
        self.inner.download_count
    }

    /// Download ceiling for this order
    async fn max_downloads(&self) -> u32 {
        self.inner.max_downloads
    }

    /// Download slots still open
    async fn remaining_downloads(&self) -> u32 {
        self.inner.remaining_downloads()
    }

    /// When the download window closes
    async fn expires_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.inner.expires_at
    }

    /// When the order was placed
    async fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.inner.created_at
    }

    /// The project this order bought
    async fn project(&self, ctx: &Context<'_>) -> FieldResult<Option<super::project::Project>> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.storage.get_project_by_id(self.inner.project_id).await {
            Ok(Some(project)) => Ok(Some(project.into())),
            Ok(None) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
