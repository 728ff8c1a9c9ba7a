use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Collection names used both for storage and for `$ref` values.
pub mod collections {
    pub const POSTS: &str = "posts";
    pub const CATEGORIES: &str = "categories";
    pub const TAGS: &str = "tags";
    pub const COMMENTS: &str = "comments";
    pub const FILES: &str = "files";
}

/// A MongoDB DBRef: `{"$ref": <collection>, "$id": <ObjectId>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbRef {
    #[serde(rename = "$ref")]
    pub collection: String,
    #[serde(rename = "$id")]
    pub id: ObjectId,
}

impl DbRef {
    pub fn new(collection: impl Into<String>, id: ObjectId) -> Self {
        Self {
            collection: collection.into(),
            id,
        }
    }

    /// Legacy documents encode "no reference" as a DBRef with a zeroed id.
    pub fn is_empty(&self) -> bool {
        self.id == ObjectId::from_bytes([0; 12])
    }
}
