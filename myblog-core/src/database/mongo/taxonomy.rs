use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{Document, doc, oid::ObjectId},
};
use serde::de::DeserializeOwned;

use super::{by_id, in_ids};
use crate::{
    BlogError, Result,
    database::ports::{CategoryRepository, TagRepository},
    domain::{Category, Tag, collections},
};

async fn find_sorted_by_name<T>(collection: &Collection<T>, filter: Document) -> Result<Vec<T>>
where
    T: DeserializeOwned + Send + Sync,
{
    let cursor = collection
        .find(filter)
        .sort(doc! { "name": 1 })
        .await
        .map_err(|err| BlogError::Query(err.to_string()))?;
    cursor
        .try_collect()
        .await
        .map_err(|err| BlogError::Query(err.to_string()))
}

#[derive(Debug, Clone)]
pub struct MongoCategoryRepository {
    collection: Collection<Category>,
}

impl MongoCategoryRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(collections::CATEGORIES),
        }
    }
}

#[async_trait]
impl CategoryRepository for MongoCategoryRepository {
    async fn find_all(&self) -> Result<Vec<Category>> {
        find_sorted_by_name(&self.collection, Document::new()).await
    }

    async fn find_all_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Category>> {
        find_sorted_by_name(&self.collection, in_ids(ids)).await
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Category> {
        self.collection
            .find_one(by_id(id))
            .await?
            .ok_or_else(|| BlogError::NotFound(format!("category {id}")))
    }
}

#[derive(Debug, Clone)]
pub struct MongoTagRepository {
    collection: Collection<Tag>,
}

impl MongoTagRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(collections::TAGS),
        }
    }
}

#[async_trait]
impl TagRepository for MongoTagRepository {
    async fn find_all(&self) -> Result<Vec<Tag>> {
        find_sorted_by_name(&self.collection, Document::new()).await
    }

    async fn find_all_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Tag>> {
        find_sorted_by_name(&self.collection, in_ids(ids)).await
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Tag> {
        self.collection
            .find_one(by_id(id))
            .await?
            .ok_or_else(|| BlogError::NotFound(format!("tag {id}")))
    }
}
