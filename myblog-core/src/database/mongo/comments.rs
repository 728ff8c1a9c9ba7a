use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{self, Document, doc, oid::ObjectId},
};

use super::{by_id, dbref, dbrefs, in_ids};
use crate::{
    BlogError, Result,
    database::ports::CommentRepository,
    domain::{Comment, collections},
    query::CommentQuery,
};

#[derive(Debug, Clone)]
pub struct MongoCommentRepository {
    collection: Collection<Comment>,
}

impl MongoCommentRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(collections::COMMENTS),
        }
    }
}

#[async_trait]
impl CommentRepository for MongoCommentRepository {
    async fn create(&self, author_id: &str) -> Result<Comment> {
        let comment = Comment::new(author_id);
        self.collection
            .insert_one(&comment)
            .await
            .map_err(|err| BlogError::Update(format!("failed to insert comment: {err}")))?;
        Ok(comment)
    }

    async fn find_all_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Comment>> {
        let cursor = self
            .collection
            .find(in_ids(ids))
            .sort(doc! { "createdAt": -1 })
            .await
            .map_err(|err| BlogError::Query(err.to_string()))?;
        cursor
            .try_collect()
            .await
            .map_err(|err| BlogError::Query(err.to_string()))
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Comment> {
        self.collection
            .find_one(by_id(id))
            .await?
            .ok_or_else(|| BlogError::NotFound(format!("comment {id}")))
    }

    async fn save(&self, id: &ObjectId, query: &CommentQuery) -> Result<Comment> {
        self.collection
            .update_one(by_id(id), comment_update(query, bson::DateTime::now()))
            .await
            .map_err(|err| BlogError::Update(err.to_string()))?;

        self.find_by_id(id).await
    }
}

pub(crate) fn comment_update(query: &CommentQuery, now: bson::DateTime) -> Document {
    let mut set = Document::new();

    if let Some(parent) = query.parent {
        set.insert("parent", dbref(collections::COMMENTS, parent));
    }
    if let Some(text) = &query.text {
        set.insert("text", text.as_str());
    }
    if let Some(children) = &query.children {
        set.insert(
            "children",
            dbrefs(collections::COMMENTS, children.iter().copied()),
        );
    }
    set.insert("updatedAt", now);

    doc! { "$set": set }
}
