use mongodb::bson::{self, oid::ObjectId};

use crate::domain::{Category, File, Status, Tag};

/// Offset/limit window applied to list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub offset: u64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 5,
        }
    }
}

/// Optional filter/update intents for posts.
///
/// Every field left as `None` is omitted when the query is rendered into a
/// backing-store filter or partial update.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub pagination: Pagination,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub status: Option<Status>,
    pub markdown: Option<String>,
    pub html: Option<String>,
    pub published_at: Option<bson::DateTime>,
    pub author_id: Option<String>,
    /// Read-side filter on a single category.
    pub category: Option<Category>,
    /// Write-side replacement of the whole category list.
    pub categories: Option<Vec<Category>>,
    pub tag: Option<Tag>,
    pub tags: Option<Vec<Tag>>,
    /// `Some(None)` clears the featured image.
    pub featured_image: Option<Option<File>>,
    pub attachments: Option<Vec<File>>,
}

/// Optional filter/update intents for comments.
#[derive(Debug, Clone, Default)]
pub struct CommentQuery {
    pub pagination: Pagination,
    pub parent: Option<ObjectId>,
    pub author_id: Option<String>,
    pub text: Option<String>,
    pub children: Option<Vec<ObjectId>>,
}
