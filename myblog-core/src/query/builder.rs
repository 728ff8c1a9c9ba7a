use mongodb::bson::{self, oid::ObjectId};

use super::types::*;
use crate::domain::{Category, Comment, File, Status, Tag};

/// Fluent API for building post queries
#[derive(Debug, Clone, Default)]
pub struct PostQueryBuilder {
    query: PostQuery,
}

impl PostQueryBuilder {
    /// Create a new query builder with offset 0 and limit 5
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.query.title = Some(title.into());
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.query.slug = Some(slug.into());
        self
    }

    /// Filter by status; `Published` also switches the sort to newest-published first
    pub fn with_status(mut self, status: Status) -> Self {
        self.query.status = Some(status);
        self
    }

    pub fn with_markdown(mut self, markdown: impl Into<String>) -> Self {
        self.query.markdown = Some(markdown.into());
        self
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.query.html = Some(html.into());
        self
    }

    pub fn with_published_at(mut self, published_at: bson::DateTime) -> Self {
        self.query.published_at = Some(published_at);
        self
    }

    /// Filter by author
    pub fn with_author_id(mut self, author_id: impl Into<String>) -> Self {
        self.query.author_id = Some(author_id.into());
        self
    }

    /// Filter posts belonging to a category
    pub fn with_category(mut self, category: Category) -> Self {
        self.query.category = Some(category);
        self
    }

    /// Replace the category list
    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.query.categories = Some(categories);
        self
    }

    /// Filter posts carrying a tag
    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.query.tag = Some(tag);
        self
    }

    /// Replace the tag list
    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.query.tags = Some(tags);
        self
    }

    /// Set or, with `None`, clear the featured image
    pub fn with_featured_image(mut self, file: Option<File>) -> Self {
        self.query.featured_image = Some(file);
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<File>) -> Self {
        self.query.attachments = Some(attachments);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.query.pagination.offset = offset;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.query.pagination.limit = limit;
        self
    }

    pub fn build(self) -> PostQuery {
        self.query
    }
}

/// Fluent API for building comment queries
#[derive(Debug, Clone, Default)]
pub struct CommentQueryBuilder {
    query: CommentQuery,
}

impl CommentQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(mut self, parent: &Comment) -> Self {
        self.query.parent = Some(parent.id);
        self
    }

    pub fn with_author_id(mut self, author_id: impl Into<String>) -> Self {
        self.query.author_id = Some(author_id.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.query.text = Some(text.into());
        self
    }

    pub fn with_children(mut self, children: &[Comment]) -> Self {
        self.query.children = Some(children.iter().map(|c| c.id).collect::<Vec<ObjectId>>());
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.query.pagination.offset = offset;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.query.pagination.limit = limit;
        self
    }

    pub fn build(self) -> CommentQuery {
        self.query
    }
}
