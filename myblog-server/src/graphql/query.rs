use async_graphql::{Context, Object, Result};

use myblog_core::{BlogError, Repositories, Status, query::PostQueryBuilder, slug};

use super::{
    current_user, gql_error, pagination,
    types::{CategoryObject, PostObject, TagObject},
};

#[derive(Debug, Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn category(&self, ctx: &Context<'_>, slug: String) -> Result<CategoryObject> {
        let id = slug::id_from_slug(&slug).map_err(gql_error)?;
        let repositories = ctx.data::<Repositories>()?;
        let category = repositories
            .categories
            .find_by_id(&id)
            .await
            .map_err(gql_error)?;
        Ok(CategoryObject(category))
    }

    async fn categories(&self, ctx: &Context<'_>) -> Result<Vec<CategoryObject>> {
        let repositories = ctx.data::<Repositories>()?;
        let categories = repositories.categories.find_all().await.map_err(gql_error)?;
        Ok(categories.into_iter().map(CategoryObject).collect())
    }

    async fn tag(&self, ctx: &Context<'_>, slug: String) -> Result<TagObject> {
        let id = slug::id_from_slug(&slug).map_err(gql_error)?;
        let repositories = ctx.data::<Repositories>()?;
        let tag = repositories.tags.find_by_id(&id).await.map_err(gql_error)?;
        Ok(TagObject(tag))
    }

    async fn tags(&self, ctx: &Context<'_>) -> Result<Vec<TagObject>> {
        let repositories = ctx.data::<Repositories>()?;
        let tags = repositories.tags.find_all().await.map_err(gql_error)?;
        Ok(tags.into_iter().map(TagObject).collect())
    }

    async fn latest_published_posts(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = 0)] offset: i64,
        #[graphql(default = 5)] limit: i64,
    ) -> Result<Vec<PostObject>> {
        let (offset, limit) = pagination(offset, limit);
        let query = PostQueryBuilder::new()
            .with_status(Status::Published)
            .with_offset(offset)
            .with_limit(limit)
            .build();
        let repositories = ctx.data::<Repositories>()?;
        let posts = repositories.posts.find_all(&query).await.map_err(gql_error)?;
        Ok(posts.into_iter().map(PostObject).collect())
    }

    async fn my_posts(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = 0)] offset: i64,
        #[graphql(default = 5)] limit: i64,
    ) -> Result<Vec<PostObject>> {
        let user = current_user(ctx)?;
        let (offset, limit) = pagination(offset, limit);
        let query = PostQueryBuilder::new()
            .with_author_id(user.subject.clone())
            .with_offset(offset)
            .with_limit(limit)
            .build();
        let repositories = ctx.data::<Repositories>()?;
        let posts = repositories.posts.find_all(&query).await.map_err(gql_error)?;
        Ok(posts.into_iter().map(PostObject).collect())
    }

    /// Published posts are public; anything else is visible to its author only.
    async fn post(&self, ctx: &Context<'_>, slug: String) -> Result<PostObject> {
        let id = slug::id_from_slug(&slug).map_err(gql_error)?;
        let repositories = ctx.data::<Repositories>()?;
        let post = repositories.posts.find_by_id(&id).await.map_err(gql_error)?;

        if post.is_published() {
            return Ok(PostObject(post));
        }

        match current_user(ctx) {
            Ok(user) if user.subject == post.author_id => Ok(PostObject(post)),
            _ => Err(gql_error(BlogError::Forbidden)),
        }
    }
}
