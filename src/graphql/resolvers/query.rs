use crate::graphql::schema::GraphQLContext;
use crate::graphql::types::{Entitlement, Order, Project, Review};
use async_graphql::{Context, FieldResult, Object, ID};
use uuid::Uuid;

/// Root query object for GraphQL
pub struct Query;

#[Object]
impl Query {
    /// Get a project by ID
    async fn project(&self, ctx: &Context<'_>, id: ID) -> FieldResult<Option<Project>> {
        let context = ctx.data::<GraphQLContext>()?;
        let project_id = Uuid::parse_str(&id)?;

        match context.storage.get_project_by_id(project_id).await {
            Ok(project) => Ok(project.map(|p| p.into())),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a project by its catalog slug
    async fn project_by_slug(
        &self,
        ctx: &Context<'_>,
        slug: String,
    ) -> FieldResult<Option<Project>> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.storage.get_project_by_slug(&slug).await {
            Ok(project) => Ok(project.map(|p| p.into())),
            Err(e) => Err(e.into()),
        }
    }

    /// Get all projects with optional pagination
    async fn projects(
        &self,
        ctx: &Context<'_>,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> FieldResult<Vec<Project>> {
        let context = ctx.data::<GraphQLContext>()?;

        let limit = limit.map(|l| l as usize);
        let offset = offset.map(|o| o as usize);

        match context.storage.get_all_projects(limit, offset).await {
            Ok(projects) => Ok(projects.into_iter().map(|p| p.into()).collect()),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a user's order history, newest first
    async fn orders_by_user(&self, ctx: &Context<'_>, user_id: String) -> FieldResult<Vec<Order>> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.storage.get_orders_by_user(&user_id).await {
            Ok(orders) => Ok(orders.into_iter().map(|o| o.into()).collect()),
            Err(e) => Err(e.into()),
        }
    }

    /// Get the reviews left on a project
    async fn reviews_by_project(
        &self,
        ctx: &Context<'_>,
        project_id: ID,
    ) -> FieldResult<Vec<Review>> {
        let context = ctx.data::<GraphQLContext>()?;
        let project_uuid = Uuid::parse_str(&project_id)?;

        match context.storage.get_reviews_by_project(project_uuid).await {
            Ok(reviews) => Ok(reviews.into_iter().map(|r| r.into()).collect()),
            Err(e) => Err(e.into()),
        }
    }

    /// Get everything a user is entitled to
    async fn entitlements_by_user(
        &self,
        ctx: &Context<'_>,
        user_id: String,
    ) -> FieldResult<Vec<Entitlement>> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.storage.get_entitlements_by_user(&user_id).await {
            Ok(entitlements) => Ok(entitlements.into_iter().map(|e| e.into()).collect()),
            Err(e) => Err(e.into()),
        }
    }
}
