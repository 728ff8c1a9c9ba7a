//! Persisted blog entities.
//!
//! Relations between documents are stored as [`DbRef`]s and resolved lazily by
//! the consuming layer; they are never denormalized into the owning document.

mod comment;
mod dbref;
mod file;
mod post;
mod taxonomy;

pub use comment::Comment;
pub use dbref::{DbRef, collections};
pub use file::File;
pub use post::{Post, Status};
pub use taxonomy::{Category, Tag};
