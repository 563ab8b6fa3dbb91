use crate::domain::Review as DomainReview;
use async_graphql::{Object, ID};

/// GraphQL representation of a Review
#[derive(Clone)]
pub struct Review {
    pub inner: DomainReview,
}

impl From<DomainReview> for Review {
    fn from(review: DomainReview) -> Self {
        Self { inner: review }
    }
}

#[Object]
impl Review {
    /// The unique identifier for the review
    async fn id(&self) -> ID {
        ID(self.inner.id.unwrap_or_default().to_string())
    }

    /// The reviewer
    async fn user_id(&self) -> &str {
        &self.inner.user_id
    }

    /// The reviewed project
    async fn project_id(&self) -> ID {
        ID(self.inner.project_id.to_string())
    }

    /// Rating on the 1 to 5 scale
    async fn rating(&self) -> u8 {
        self.inner.rating
    }

    /// Free-form comment
    async fn comment(&self) -> Option<&str> {
        self.inner.comment.as_deref()
    }

    /// When the review was first submitted
    async fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.inner.created_at
    }

    /// When the review was last changed
    async fn updated_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.inner.updated_at
    }
}
