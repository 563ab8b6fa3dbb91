use crate::domain::Project as DomainProject;
use crate::graphql::schema::GraphQLContext;
use async_graphql::{Context, FieldResult, Object, ID};

/// GraphQL representation of a Project
#[derive(Clone)]
pub struct Project {
    pub inner: DomainProject,
}

impl From<DomainProject> for Project {
    fn from(project: DomainProject) -> Self {
        Self { inner: project }
    }
}

#[Object]
impl Project {
    /// The unique identifier for the project
    async fn id(&self) -> ID {
        ID(self.inner.id.unwrap_or_default().to_string())
    }

    /// The display title of the project
    async fn title(&self) -> &str {
        &self.inner.title
    }

    /// The URL-safe catalog slug
    async fn slug(&self) -> &str {
        &self.inner.slug
    }

    /// Description of the project
    async fn description(&self) -> Option<&str> {
        self.inner.description.as_deref()
    }

    /// Price in integer cents
    async fn price_cents(&self) -> i64 {
        self.inner.price_cents
    }

    /// Whether the project is free to acquire
    async fn is_free(&self) -> bool {
        self.inner.is_free
    }

    /// Whether the project is visible in the catalog
    async fn is_published(&self) -> bool {
        self.inner.is_published
    }

    /// How many times the project has been purchased
    async fn purchases(&self) -> u64 {
        self.inner.purchases
    }

    /// How many downloads have been served
    async fn downloads(&self) -> u64 {
        self.inner.downloads
    }

    /// Mean review rating, 0.0 when unreviewed
    async fn rating(&self) -> f64 {
        self.inner.rating
    }

    /// When the project was created
    async fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.inner.created_at
    }

    /// Reviews left on this project
    async fn reviews(&self, ctx: &Context<'_>) -> FieldResult<Vec<super::review::Review>> {
        let context = ctx.data::<GraphQLContext>()?;
        let project_id = self.inner.id.unwrap_or_default();

        match context.storage.get_reviews_by_project(project_id).await {
            Ok(reviews) => Ok(reviews.into_iter().map(|r| r.into()).collect()),
            Err(e) => Err(e.into()),
        }
    }
}
