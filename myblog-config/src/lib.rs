//! Configuration for the myblog server.
//!
//! Values are layered: built-in defaults, then an optional `myblog.toml`, then
//! environment variables (optionally seeded from `.env`), then overrides such
//! as command-line flags. The merged result is validated once.

pub mod loader;
pub mod models;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader};
pub use models::{
    AlgoliaConfig, AmazonS3Config, AuthConfig, CacheConfig, Config, ConfigMetadata,
    DatabaseConfig, FacebookConfig, GoogleCloudConfig, ServerConfig, StorageConfig,
};
pub use validation::{ConfigWarning, ConfigWarnings};
