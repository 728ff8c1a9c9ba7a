//! MongoDB adapters for the repository ports.
//!
//! Filter, sort and update documents are rendered by free functions so they can
//! be checked without a running server.

mod comments;
mod files;
mod posts;
mod taxonomy;

pub use comments::MongoCommentRepository;
pub use files::MongoFileRepository;
pub use posts::MongoPostRepository;
pub use taxonomy::{MongoCategoryRepository, MongoTagRepository};

use mongodb::bson::{Bson, Document, doc, oid::ObjectId};

fn by_id(id: &ObjectId) -> Document {
    doc! { "_id": *id }
}

fn in_ids(ids: &[ObjectId]) -> Document {
    doc! { "_id": { "$in": ids.to_vec() } }
}

fn dbref(collection: &str, id: ObjectId) -> Bson {
    Bson::Document(doc! { "$ref": collection, "$id": id })
}

fn dbrefs(collection: &str, ids: impl IntoIterator<Item = ObjectId>) -> Bson {
    Bson::Array(ids.into_iter().map(|id| dbref(collection, id)).collect())
}
