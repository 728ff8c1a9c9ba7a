use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{self, oid::ObjectId},
};
use tracing::info;

use super::{by_id, in_ids};
use crate::{
    BlogError, Result,
    database::ports::FileRepository,
    domain::{File, collections},
};

#[derive(Debug, Clone)]
pub struct MongoFileRepository {
    collection: Collection<File>,
}

impl MongoFileRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(collections::FILES),
        }
    }
}

#[async_trait]
impl FileRepository for MongoFileRepository {
    async fn create(&self, mut file: File) -> Result<File> {
        if file.id == ObjectId::from_bytes([0; 12]) {
            file.id = ObjectId::new();
        }
        file.created_at = bson::DateTime::now();

        self.collection
            .insert_one(&file)
            .await
            .map_err(|err| BlogError::Update(format!("failed to insert file: {err}")))?;
        info!(id = %file.id, path = %file.path, "file record created");
        Ok(file)
    }

    async fn delete(&self, id: &ObjectId) -> Result<()> {
        self.collection
            .delete_one(by_id(id))
            .await
            .map_err(|err| BlogError::Update(err.to_string()))?;
        Ok(())
    }

    async fn find_all_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<File>> {
        let cursor = self
            .collection
            .find(in_ids(ids))
            .await
            .map_err(|err| BlogError::Query(err.to_string()))?;
        cursor
            .try_collect()
            .await
            .map_err(|err| BlogError::Query(err.to_string()))
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<File> {
        self.collection
            .find_one(by_id(id))
            .await?
            .ok_or_else(|| BlogError::NotFound(format!("file {id}")))
    }
}
