use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::{
    Result,
    domain::{Category, Tag},
};

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Category>>;
    async fn find_all_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Category>>;
    async fn find_by_id(&self, id: &ObjectId) -> Result<Category>;
}

#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Tag>>;
    async fn find_all_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Tag>>;
    async fn find_by_id(&self, id: &ObjectId) -> Result<Tag>;
}
