use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{self, Bson, Document, doc, oid::ObjectId},
};
use tracing::debug;

use super::{by_id, dbref, dbrefs};
use crate::{
    BlogError, Result,
    database::ports::PostRepository,
    domain::{Post, Status, collections},
    query::PostQuery,
};

#[derive(Debug, Clone)]
pub struct MongoPostRepository {
    collection: Collection<Post>,
}

impl MongoPostRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(collections::POSTS),
        }
    }
}

#[async_trait]
impl PostRepository for MongoPostRepository {
    async fn create(&self, author_id: &str) -> Result<Post> {
        let post = Post::draft(author_id);
        self.collection
            .insert_one(&post)
            .await
            .map_err(|err| BlogError::Update(format!("failed to insert post: {err}")))?;
        Ok(post)
    }

    async fn find_all(&self, query: &PostQuery) -> Result<Vec<Post>> {
        let filter = post_filter(query);
        debug!(?filter, "finding posts");

        let cursor = self
            .collection
            .find(filter)
            .sort(post_sort(query))
            .skip(query.pagination.offset)
            .limit(query.pagination.limit)
            .await
            .map_err(|err| BlogError::Query(err.to_string()))?;

        cursor
            .try_collect()
            .await
            .map_err(|err| BlogError::Query(err.to_string()))
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Post> {
        self.collection
            .find_one(by_id(id))
            .await?
            .ok_or_else(|| BlogError::NotFound(format!("post {id}")))
    }

    async fn save(&self, id: &ObjectId, query: &PostQuery) -> Result<Post> {
        let update = post_update(query, bson::DateTime::now());
        self.collection
            .update_one(by_id(id), update)
            .await
            .map_err(|err| BlogError::Update(err.to_string()))?;

        self.find_by_id(id).await
    }
}

pub(crate) fn post_filter(query: &PostQuery) -> Document {
    let mut filter = Document::new();
    if let Some(status) = query.status {
        filter.insert("status", status.as_str());
    }
    if let Some(author_id) = &query.author_id {
        filter.insert("authorId", author_id.as_str());
    }
    if let Some(category) = &query.category {
        filter.insert("categories.$id", category.id);
    }
    if let Some(tag) = &query.tag {
        filter.insert("tags.$id", tag.id);
    }
    filter
}

pub(crate) fn post_sort(query: &PostQuery) -> Document {
    match query.status {
        Some(Status::Published) => doc! { "publishedAt": -1 },
        Some(_) => doc! { "createdAt": -1 },
        None => doc! { "status": 1, "createdAt": -1 },
    }
}

pub(crate) fn post_update(query: &PostQuery, now: bson::DateTime) -> Document {
    let mut set = Document::new();

    if let Some(title) = &query.title {
        set.insert("title", title.as_str());
    }
    if let Some(slug) = &query.slug {
        set.insert("slug", slug.as_str());
    }
    if let Some(status) = query.status {
        set.insert("status", status.as_str());
    }
    if let Some(markdown) = &query.markdown {
        set.insert("markdown", markdown.as_str());
    }
    if let Some(html) = &query.html {
        set.insert("html", html.as_str());
    }
    if let Some(published_at) = query.published_at {
        set.insert("publishedAt", published_at);
    }
    if let Some(categories) = &query.categories {
        set.insert(
            "categories",
            dbrefs(collections::CATEGORIES, categories.iter().map(|c| c.id)),
        );
    }
    if let Some(tags) = &query.tags {
        set.insert("tags", dbrefs(collections::TAGS, tags.iter().map(|t| t.id)));
    }
    if let Some(featured_image) = &query.featured_image {
        let value = match featured_image {
            Some(file) => dbref(collections::FILES, file.id),
            None => Bson::Null,
        };
        set.insert("featuredImage", value);
    }
    if let Some(attachments) = &query.attachments {
        set.insert(
            "attachments",
            dbrefs(collections::FILES, attachments.iter().map(|f| f.id)),
        );
    }
    set.insert("updatedAt", now);

    doc! { "$set": set }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, File, Tag};
    use crate::query::PostQueryBuilder;

    fn set_of(update: &Document) -> &Document {
        update.get_document("$set").expect("update carries $set")
    }

    #[test]
    fn empty_query_renders_empty_filter_and_status_then_created_sort() {
        let query = PostQueryBuilder::new().build();
        assert!(post_filter(&query).is_empty());
        assert_eq!(post_sort(&query), doc! { "status": 1, "createdAt": -1 });
    }

    #[test]
    fn published_status_sorts_by_published_at_descending() {
        let query = PostQueryBuilder::new().with_status(Status::Published).build();
        assert_eq!(post_filter(&query), doc! { "status": "PUBLISHED" });
        assert_eq!(post_sort(&query), doc! { "publishedAt": -1 });
    }

    #[test]
    fn draft_status_sorts_by_created_at_descending() {
        let query = PostQueryBuilder::new().with_status(Status::Draft).build();
        assert_eq!(post_sort(&query), doc! { "createdAt": -1 });
    }

    #[test]
    fn category_and_tag_filter_on_dbref_ids() {
        let category = Category { id: ObjectId::new(), name: "Web".into(), slug: "web".into() };
        let tag = Tag { id: ObjectId::new(), name: "Rust".into(), slug: "rust".into() };
        let query = PostQueryBuilder::new()
            .with_author_id("auth0|1")
            .with_category(category.clone())
            .with_tag(tag.clone())
            .build();

        let filter = post_filter(&query);
        assert_eq!(filter.get_str("authorId").expect("authorId"), "auth0|1");
        assert_eq!(filter.get_object_id("categories.$id").expect("category"), category.id);
        assert_eq!(filter.get_object_id("tags.$id").expect("tag"), tag.id);
    }

    #[test]
    fn update_contains_only_set_fields_plus_updated_at() {
        let now = bson::DateTime::now();
        let query = PostQueryBuilder::new().with_title("Hello").build();
        let update = post_update(&query, now);
        let set = set_of(&update);

        assert_eq!(set.len(), 2);
        assert_eq!(set.get_str("title").expect("title"), "Hello");
        assert_eq!(set.get_datetime("updatedAt").expect("updatedAt"), &now);
    }

    #[test]
    fn empty_update_still_stamps_updated_at() {
        let update = post_update(&PostQueryBuilder::new().build(), bson::DateTime::now());
        let set = set_of(&update);
        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["updatedAt"]);
    }

    #[test]
    fn references_are_rendered_as_dbrefs() {
        let file = File::new(ObjectId::new(), "a/b.png", "b.png", "b-1.png");
        let category = Category { id: ObjectId::new(), name: "Web".into(), slug: "web".into() };
        let query = PostQueryBuilder::new()
            .with_categories(vec![category.clone()])
            .with_attachments(vec![file.clone()])
            .with_featured_image(Some(file.clone()))
            .build();
        let update = post_update(&query, bson::DateTime::now());
        let set = set_of(&update);

        let categories = set.get_array("categories").expect("categories");
        assert_eq!(
            categories[0],
            Bson::Document(doc! { "$ref": "categories", "$id": category.id })
        );
        assert_eq!(
            set.get_document("featuredImage").expect("featuredImage"),
            &doc! { "$ref": "files", "$id": file.id }
        );
        assert_eq!(set.get_array("attachments").expect("attachments").len(), 1);
    }

    #[test]
    fn clearing_featured_image_sets_null() {
        let query = PostQueryBuilder::new().with_featured_image(None).build();
        let update = post_update(&query, bson::DateTime::now());
        assert_eq!(set_of(&update).get("featuredImage"), Some(&Bson::Null));
    }
}
