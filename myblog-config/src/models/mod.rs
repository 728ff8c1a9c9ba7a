pub mod sources;

use std::path::{Path, PathBuf};

use myblog_core::storage::StorageDriver;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub facebook: FacebookConfig,
    pub algolia: AlgoliaConfig,
    pub metadata: ConfigMetadata,
}

impl Config {
    pub fn cache_root(&self) -> &Path {
        &self.cache.root
    }

    /// Base URL without a trailing slash, ready for `format!("{base}/...")`.
    pub fn base_url(&self) -> &str {
        self.server.base_url.trim_end_matches('/')
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_address: String,
    pub allow_cors: bool,
    pub base_url: String,
    pub static_file_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub uri: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Also the blob root for the local-disk storage driver.
    pub root: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub driver: StorageDriver,
    pub amazon_s3: AmazonS3Config,
    pub gcloud: GoogleCloudConfig,
}

#[derive(Clone)]
pub struct AmazonS3Config {
    pub region: String,
    pub bucket_name: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl std::fmt::Debug for AmazonS3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmazonS3Config")
            .field("region", &self.region)
            .field("bucket_name", &self.bucket_name)
            .field("access_key", &self.access_key.as_ref().map(|_| "<redacted>"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct GoogleCloudConfig {
    pub bucket_name: String,
    pub credentials_file_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub audience: String,
    pub issuer: String,
    pub jwks_uri: String,
}

#[derive(Clone, Default)]
pub struct FacebookConfig {
    pub app_access_token: Option<String>,
}

impl std::fmt::Debug for FacebookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacebookConfig")
            .field(
                "app_access_token",
                &self.app_access_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[derive(Clone, Default)]
pub struct AlgoliaConfig {
    pub app_id: Option<String>,
    pub api_key: Option<String>,
}

impl AlgoliaConfig {
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.app_id.as_deref(), self.api_key.as_deref()) {
            (Some(id), Some(key)) if !id.is_empty() && !key.is_empty() => Some((id, key)),
            _ => None,
        }
    }
}

impl std::fmt::Debug for AlgoliaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgoliaConfig")
            .field("app_id", &self.app_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
