use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::{Result, domain::Comment, query::CommentQuery};

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, author_id: &str) -> Result<Comment>;
    async fn find_all_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Comment>>;
    async fn find_by_id(&self, id: &ObjectId) -> Result<Comment>;
    async fn save(&self, id: &ObjectId, query: &CommentQuery) -> Result<Comment>;
}
