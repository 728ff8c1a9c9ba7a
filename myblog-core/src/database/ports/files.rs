use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::{Result, domain::File};

/// Catalog of uploaded blobs.
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Insert `file`, assigning an id when it carries a zeroed one.
    async fn create(&self, file: File) -> Result<File>;
    async fn delete(&self, id: &ObjectId) -> Result<()>;
    async fn find_all_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<File>>;
    async fn find_by_id(&self, id: &ObjectId) -> Result<File>;
}
