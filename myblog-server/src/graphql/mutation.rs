use async_graphql::{Context, Object, Result};

use myblog_core::{
    BlogError, Category, File, ObjectId, Post, Repositories, Status, Tag, content,
    query::{PostQuery, PostQueryBuilder},
    slug, timeutil,
};

use super::{current_user, gql_error, types::{PostObject, StatusValue}};

#[derive(Debug, Default)]
pub struct MutationRoot;

/// Load the post behind `slug` and make sure the caller wrote it.
async fn owned_post(ctx: &Context<'_>, post_slug: &str) -> Result<(ObjectId, Post)> {
    let user = current_user(ctx)?;
    let id = slug::id_from_slug(post_slug).map_err(gql_error)?;
    let repositories = ctx.data::<Repositories>()?;
    let post = repositories.posts.find_by_id(&id).await.map_err(gql_error)?;

    if post.author_id != user.subject {
        return Err(gql_error(BlogError::Forbidden));
    }
    Ok((id, post))
}

async fn save(ctx: &Context<'_>, id: &ObjectId, query: PostQuery) -> Result<PostObject> {
    let repositories = ctx.data::<Repositories>()?;
    let post = repositories.posts.save(id, &query).await.map_err(gql_error)?;
    Ok(PostObject(post))
}

fn file_ref(id: ObjectId) -> File {
    File::new(id, "", "", "")
}

#[Object]
impl MutationRoot {
    async fn create_post(&self, ctx: &Context<'_>) -> Result<PostObject> {
        let user = current_user(ctx)?;
        let repositories = ctx.data::<Repositories>()?;
        let post = repositories
            .posts
            .create(&user.subject)
            .await
            .map_err(gql_error)?;
        Ok(PostObject(post))
    }

    /// Also re-slugs the post as `{slugified title}-{id}`.
    async fn update_post_title(
        &self,
        ctx: &Context<'_>,
        slug: String,
        title: String,
    ) -> Result<PostObject> {
        let (id, _) = owned_post(ctx, &slug).await?;
        let new_slug = slug::compose(&title, &id);
        let query = PostQueryBuilder::new()
            .with_title(title)
            .with_slug(new_slug)
            .build();
        save(ctx, &id, query).await
    }

    /// `publishedAt` is stamped the first time a post is published.
    async fn update_post_status(
        &self,
        ctx: &Context<'_>,
        slug: String,
        status: StatusValue,
    ) -> Result<PostObject> {
        let (id, post) = owned_post(ctx, &slug).await?;
        let status = Status::from(status);
        let mut builder = PostQueryBuilder::new().with_status(status);
        if status == Status::Published && timeutil::is_unset(post.published_at) {
            builder = builder.with_published_at(mongodb::bson::DateTime::now());
        }
        save(ctx, &id, builder.build()).await
    }

    async fn update_post_content(
        &self,
        ctx: &Context<'_>,
        slug: String,
        markdown: String,
    ) -> Result<PostObject> {
        let (id, _) = owned_post(ctx, &slug).await?;
        let html = content::render_html(&markdown);
        let query = PostQueryBuilder::new()
            .with_markdown(markdown)
            .with_html(html)
            .build();
        save(ctx, &id, query).await
    }

    async fn update_post_categories(
        &self,
        ctx: &Context<'_>,
        slug: String,
        category_slugs: Vec<String>,
    ) -> Result<PostObject> {
        let (id, _) = owned_post(ctx, &slug).await?;
        let categories = category_slugs
            .iter()
            .map(|s| {
                slug::id_from_slug(s).map(|id| Category {
                    id,
                    name: String::new(),
                    slug: String::new(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(gql_error)?;
        save(ctx, &id, PostQueryBuilder::new().with_categories(categories).build()).await
    }

    async fn update_post_tags(
        &self,
        ctx: &Context<'_>,
        slug: String,
        tag_slugs: Vec<String>,
    ) -> Result<PostObject> {
        let (id, _) = owned_post(ctx, &slug).await?;
        let tags = tag_slugs
            .iter()
            .map(|s| {
                slug::id_from_slug(s).map(|id| Tag {
                    id,
                    name: String::new(),
                    slug: String::new(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(gql_error)?;
        save(ctx, &id, PostQueryBuilder::new().with_tags(tags).build()).await
    }

    /// An empty or missing `featuredImageSlug` clears the image.
    async fn update_post_featured_image(
        &self,
        ctx: &Context<'_>,
        slug: String,
        featured_image_slug: Option<String>,
    ) -> Result<PostObject> {
        let (id, _) = owned_post(ctx, &slug).await?;
        let file = match featured_image_slug.as_deref().filter(|s| !s.is_empty()) {
            Some(image_slug) => Some(file_ref(
                slug::id_from_storage_slug(image_slug).map_err(gql_error)?,
            )),
            None => None,
        };
        save(ctx, &id, PostQueryBuilder::new().with_featured_image(file).build()).await
    }

    async fn update_post_attachments(
        &self,
        ctx: &Context<'_>,
        slug: String,
        attachment_slugs: Vec<String>,
    ) -> Result<PostObject> {
        let (id, _) = owned_post(ctx, &slug).await?;
        let attachments = attachment_slugs
            .iter()
            .map(|s| slug::id_from_storage_slug(s).map(file_ref))
            .collect::<Result<Vec<_>, _>>()
            .map_err(gql_error)?;
        save(ctx, &id, PostQueryBuilder::new().with_attachments(attachments).build()).await
    }
}
