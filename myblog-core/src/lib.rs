//! # myblog core
//!
//! Domain types, persistence and content plumbing for the myblog backend.
//!
//! ## Overview
//!
//! - **Domain**: posts, categories, tags, comments and uploaded files
//! - **Query builders**: fluent accumulation of optional filter/update intents
//! - **Repositories**: async ports with MongoDB adapters
//! - **Storage**: pluggable blob backends fronted by a disk cache and an
//!   on-demand Lanczos resizer
//! - **Content**: slugs, markdown rendering, sitemap and Open Graph documents
//!
//! ## Architecture
//!
//! - [`domain`]: persisted entities and lightweight DB references
//! - [`query`]: `PostQueryBuilder` and `CommentQueryBuilder`
//! - [`database`]: repository ports and the MongoDB infrastructure
//! - [`storage`]: blob storage, cache and the download pipeline
//! - [`image`]: resizer port and the Lanczos implementation

pub mod content;
pub mod database;
pub mod domain;
pub mod error;
pub mod image;
pub mod opengraph;
pub mod query;
pub mod sitemap;
pub mod slug;
pub mod storage;
pub mod timeutil;

pub use database::Repositories;
pub use domain::{Category, Comment, DbRef, File, Post, Status, Tag};
pub use error::{BlogError, Result};
pub use mongodb::bson::oid::ObjectId;
