use async_graphql::{Context, Enum, Object, Result, SimpleObject};
use chrono::{DateTime, Utc};

use myblog_core::{
    Category, File, Post, Repositories, Status, Tag, opengraph::post_url, query::PostQueryBuilder,
    timeutil,
};

use super::{SiteUrl, engagement::EngagementSource, gql_error, pagination};

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(name = "Status")]
pub enum StatusValue {
    Published,
    Draft,
    PendingReview,
}

impl From<Status> for StatusValue {
    fn from(status: Status) -> Self {
        match status {
            Status::Published => Self::Published,
            Status::Draft => Self::Draft,
            Status::PendingReview => Self::PendingReview,
        }
    }
}

impl From<StatusValue> for Status {
    fn from(status: StatusValue) -> Self {
        match status {
            StatusValue::Published => Self::Published,
            StatusValue::Draft => Self::Draft,
            StatusValue::PendingReview => Self::PendingReview,
        }
    }
}

#[derive(SimpleObject, Debug, Clone, Copy, Default)]
pub struct Engagement {
    pub share_count: i64,
}

fn time(dt: Option<mongodb::bson::DateTime>) -> Option<DateTime<Utc>> {
    dt.filter(|t| !timeutil::is_unset(Some(*t)))
        .map(timeutil::to_chrono)
}

#[derive(Debug, Clone)]
pub struct PostObject(pub Post);

#[Object(name = "Post")]
impl PostObject {
    async fn id(&self) -> String {
        self.0.id.to_hex()
    }

    async fn title(&self) -> &str {
        &self.0.title
    }

    async fn slug(&self) -> &str {
        &self.0.slug
    }

    async fn status(&self) -> StatusValue {
        self.0.status.into()
    }

    async fn markdown(&self) -> &str {
        &self.0.markdown
    }

    async fn html(&self) -> &str {
        &self.0.html
    }

    async fn published_at(&self) -> Option<DateTime<Utc>> {
        time(self.0.published_at)
    }

    async fn author_id(&self) -> &str {
        &self.0.author_id
    }

    async fn categories(&self, ctx: &Context<'_>) -> Result<Vec<CategoryObject>> {
        let repositories = ctx.data::<Repositories>()?;
        let categories = repositories
            .categories
            .find_all_by_ids(&self.0.category_ids())
            .await
            .map_err(gql_error)?;
        Ok(categories.into_iter().map(CategoryObject).collect())
    }

    async fn tags(&self, ctx: &Context<'_>) -> Result<Vec<TagObject>> {
        let repositories = ctx.data::<Repositories>()?;
        let tags = repositories
            .tags
            .find_all_by_ids(&self.0.tag_ids())
            .await
            .map_err(gql_error)?;
        Ok(tags.into_iter().map(TagObject).collect())
    }

    async fn featured_image(&self, ctx: &Context<'_>) -> Result<Option<FileObject>> {
        let Some(id) = self.0.featured_image_id() else {
            return Ok(None);
        };
        let repositories = ctx.data::<Repositories>()?;
        match repositories.files.find_by_id(&id).await {
            Ok(file) => Ok(Some(FileObject(file))),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(gql_error(err)),
        }
    }

    async fn attachments(&self, ctx: &Context<'_>) -> Result<Vec<FileObject>> {
        let repositories = ctx.data::<Repositories>()?;
        let files = repositories
            .files
            .find_all_by_ids(&self.0.attachment_ids())
            .await
            .map_err(gql_error)?;
        Ok(files.into_iter().map(FileObject).collect())
    }

    async fn engagement(&self, ctx: &Context<'_>) -> Result<Engagement> {
        if !self.0.is_published() {
            return Ok(Engagement::default());
        }
        let source = ctx.data::<std::sync::Arc<dyn EngagementSource>>()?;
        let SiteUrl(base_url) = ctx.data::<SiteUrl>()?;
        let share_count = source.share_count(&post_url(base_url, &self.0)).await;
        Ok(Engagement { share_count })
    }

    async fn created_at(&self) -> DateTime<Utc> {
        timeutil::to_chrono(self.0.created_at)
    }

    async fn updated_at(&self) -> Option<DateTime<Utc>> {
        time(self.0.updated_at)
    }
}

#[derive(Debug, Clone)]
pub struct CategoryObject(pub Category);

#[Object(name = "Category")]
impl CategoryObject {
    async fn id(&self) -> String {
        self.0.id.to_hex()
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn slug(&self) -> &str {
        &self.0.slug
    }

    async fn latest_published_posts(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = 0)] offset: i64,
        #[graphql(default = 5)] limit: i64,
    ) -> Result<Vec<PostObject>> {
        let (offset, limit) = pagination(offset, limit);
        let query = PostQueryBuilder::new()
            .with_category(self.0.clone())
            .with_status(Status::Published)
            .with_offset(offset)
            .with_limit(limit)
            .build();
        let repositories = ctx.data::<Repositories>()?;
        let posts = repositories.posts.find_all(&query).await.map_err(gql_error)?;
        Ok(posts.into_iter().map(PostObject).collect())
    }
}

#[derive(Debug, Clone)]
pub struct TagObject(pub Tag);

#[Object(name = "Tag")]
impl TagObject {
    async fn id(&self) -> String {
        self.0.id.to_hex()
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn slug(&self) -> &str {
        &self.0.slug
    }

    async fn latest_published_posts(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = 0)] offset: i64,
        #[graphql(default = 5)] limit: i64,
    ) -> Result<Vec<PostObject>> {
        let (offset, limit) = pagination(offset, limit);
        let query = PostQueryBuilder::new()
            .with_tag(self.0.clone())
            .with_status(Status::Published)
            .with_offset(offset)
            .with_limit(limit)
            .build();
        let repositories = ctx.data::<Repositories>()?;
        let posts = repositories.posts.find_all(&query).await.map_err(gql_error)?;
        Ok(posts.into_iter().map(PostObject).collect())
    }
}

#[derive(Debug, Clone)]
pub struct FileObject(pub File);

#[Object(name = "File")]
impl FileObject {
    async fn id(&self) -> String {
        self.0.id.to_hex()
    }

    async fn path(&self) -> &str {
        &self.0.path
    }

    async fn file_name(&self) -> &str {
        &self.0.file_name
    }

    async fn slug(&self) -> &str {
        &self.0.slug
    }

    async fn created_at(&self) -> DateTime<Utc> {
        timeutil::to_chrono(self.0.created_at)
    }

    async fn updated_at(&self) -> Option<DateTime<Utc>> {
        time(self.0.updated_at)
    }
}
