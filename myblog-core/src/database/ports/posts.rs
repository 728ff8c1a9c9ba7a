use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::{Result, domain::Post, query::PostQuery};

/// Repository port for posts.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert an empty draft owned by `author_id`.
    async fn create(&self, author_id: &str) -> Result<Post>;

    /// Posts matching the query's filters, sorted and windowed. Never fails on zero matches.
    async fn find_all(&self, query: &PostQuery) -> Result<Vec<Post>>;

    async fn find_by_id(&self, id: &ObjectId) -> Result<Post>;

    /// Apply only the fields set on `query`, stamp `updatedAt`, then re-read.
    async fn save(&self, id: &ObjectId, query: &PostQuery) -> Result<Post>;
}
