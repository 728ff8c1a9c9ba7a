pub mod mongo;
pub mod ports;

use std::fmt;
use std::sync::Arc;

use ports::{
    CategoryRepository, CommentRepository, FileRepository, PostRepository,
    TagRepository,
};

/// Aggregates the repository ports used by the HTTP and GraphQL layers.
#[derive(Clone)]
pub struct Repositories {
    pub posts: Arc<dyn PostRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub files: Arc<dyn FileRepository>,
}

impl Repositories {
    /// Wire every port to its MongoDB adapter on `db`.
    pub fn mongo(db: &mongodb::Database) -> Self {
        Self {
            posts: Arc::new(mongo::MongoPostRepository::new(db)),
            categories: Arc::new(mongo::MongoCategoryRepository::new(db)),
            tags: Arc::new(mongo::MongoTagRepository::new(db)),
            comments: Arc::new(mongo::MongoCommentRepository::new(db)),
            files: Arc::new(mongo::MongoFileRepository::new(db)),
        }
    }
}

impl fmt::Debug for Repositories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
