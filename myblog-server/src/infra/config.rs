pub use myblog_config::{
    AlgoliaConfig, AmazonS3Config, AuthConfig, CacheConfig, Config, ConfigLoad, ConfigLoadError,
    ConfigLoader, ConfigMetadata, ConfigWarnings, DatabaseConfig, FacebookConfig,
    GoogleCloudConfig, ServerConfig, StorageConfig, loader, models, validation,
};
