use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::DbRef;

/// A threaded discussion entry; replies reference their parent and vice versa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<DbRef>,
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub children: Vec<DbRef>,
    pub created_at: bson::DateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<bson::DateTime>,
}

impl Comment {
    pub fn new(author_id: impl Into<String>) -> Self {
        Self {
            id: ObjectId::new(),
            parent: None,
            author_id: author_id.into(),
            text: String::new(),
            children: Vec::new(),
            created_at: bson::DateTime::now(),
            updated_at: None,
        }
    }
}
