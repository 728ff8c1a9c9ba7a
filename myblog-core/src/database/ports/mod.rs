pub mod comments;
pub mod files;
pub mod posts;
pub mod taxonomy;

pub use comments::CommentRepository;
pub use files::FileRepository;
pub use posts::PostRepository;
pub use taxonomy::{CategoryRepository, TagRepository};
