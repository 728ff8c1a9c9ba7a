use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::DbRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Published,
    Draft,
    PendingReview,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Published => "PUBLISHED",
            Status::Draft => "DRAFT",
            Status::PendingReview => "PENDING_REVIEW",
        }
    }
}

/// A piece of content written by a single author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub title: String,
    /// URL slug composed of the title words and the hex id.
    #[serde(default)]
    pub slug: String,
    pub status: Status,
    #[serde(default)]
    pub markdown: String,
    #[serde(default)]
    pub html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<bson::DateTime>,
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub categories: Vec<DbRef>,
    #[serde(default)]
    pub tags: Vec<DbRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<DbRef>,
    #[serde(default)]
    pub attachments: Vec<DbRef>,
    pub created_at: bson::DateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<bson::DateTime>,
}

impl Post {
    /// A fresh draft owned by `author_id`; the slug starts out as the hex id.
    pub fn draft(author_id: impl Into<String>) -> Self {
        let id = ObjectId::new();
        Self {
            id,
            title: String::new(),
            slug: id.to_hex(),
            status: Status::Draft,
            markdown: String::new(),
            html: String::new(),
            published_at: None,
            author_id: author_id.into(),
            categories: Vec::new(),
            tags: Vec::new(),
            featured_image: None,
            attachments: Vec::new(),
            created_at: bson::DateTime::now(),
            updated_at: None,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == Status::Published
    }

    pub fn category_ids(&self) -> Vec<ObjectId> {
        self.categories.iter().map(|r| r.id).collect()
    }

    pub fn tag_ids(&self) -> Vec<ObjectId> {
        self.tags.iter().map(|r| r.id).collect()
    }

    pub fn attachment_ids(&self) -> Vec<ObjectId> {
        self.attachments.iter().map(|r| r.id).collect()
    }

    pub fn featured_image_id(&self) -> Option<ObjectId> {
        self.featured_image
            .as_ref()
            .filter(|r| !r.is_empty())
            .map(|r| r.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_uses_hex_id_as_slug() {
        let post = Post::draft("auth0|1234");
        assert_eq!(post.slug, post.id.to_hex());
        assert_eq!(post.status, Status::Draft);
        assert!(post.published_at.is_none());
    }

    #[test]
    fn zeroed_featured_image_is_treated_as_absent() {
        let mut post = Post::draft("author");
        post.featured_image = Some(DbRef::new("files", ObjectId::from_bytes([0; 12])));
        assert_eq!(post.featured_image_id(), None);

        let id = ObjectId::new();
        post.featured_image = Some(DbRef::new("files", id));
        assert_eq!(post.featured_image_id(), Some(id));
    }

    #[test]
    fn status_serializes_in_screaming_snake_case() {
        let value = serde_json::to_value(Status::PendingReview).expect("serialize status");
        assert_eq!(value, serde_json::json!("PENDING_REVIEW"));
        assert_eq!(Status::PendingReview.as_str(), "PENDING_REVIEW");
    }
}
