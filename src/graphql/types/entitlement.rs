use crate::domain::Entitlement as DomainEntitlement;
use crate::graphql::schema::GraphQLContext;
use async_graphql::{Context, FieldResult, Object, ID};

/// GraphQL representation of an Entitlement
#[derive(Clone)]
pub struct Entitlement {
    pub inner: DomainEntitlement,
}

impl From<DomainEntitlement> for Entitlement {
    fn from(entitlement: DomainEntitlement) -> Self {
        Self { inner: entitlement }
    }
}

#[Object]
impl Entitlement {
    /// The entitled user
    async fn user_id(&self) -> &str {
        &self.inner.user_id
    }

    /// The entitled project
    async fn project_id(&self) -> ID {
        ID(self.inner.project_id.to_string())
    }

    /// The order that granted the entitlement, absent for free grants
    async fn via_order(&self) -> Option<ID> {
        self.inner.via_order.map(|id| ID(id.to_string()))
    }

    /// When the entitlement was granted
    async fn granted_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.inner.granted_at
    }

    /// The project this entitlement covers
    async fn project(&self, ctx: &Context<'_>) -> FieldResult<Option<super::project::Project>> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.storage.get_project_by_id(self.inner.project_id).await {
            Ok(Some(project)) => Ok(Some(project.into())),
            Ok(None) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
