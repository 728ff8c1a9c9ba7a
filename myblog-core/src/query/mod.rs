pub mod builder;
pub mod types;

pub use builder::{CommentQueryBuilder, PostQueryBuilder};
pub use types::{CommentQuery, Pagination, PostQuery};
