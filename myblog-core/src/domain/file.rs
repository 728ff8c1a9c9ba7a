use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Catalog entry for an uploaded blob. The bytes live in the blob store under `path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub optional_field1: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub optional_field2: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub optional_field3: String,
    pub created_at: bson::DateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<bson::DateTime>,
}

impl File {
    pub fn new(
        id: ObjectId,
        path: impl Into<String>,
        file_name: impl Into<String>,
        slug: impl Into<String>,
    ) -> Self {
        Self {
            id,
            path: path.into(),
            file_name: file_name.into(),
            slug: slug.into(),
            optional_field1: String::new(),
            optional_field2: String::new(),
            optional_field3: String::new(),
            created_at: bson::DateTime::now(),
            updated_at: None,
        }
    }
}
