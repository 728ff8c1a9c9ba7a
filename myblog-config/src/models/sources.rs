use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub cache: FileCacheConfig,
    #[serde(default)]
    pub storage: FileStorageConfig,
    #[serde(default)]
    pub auth: FileAuthConfig,
    #[serde(default)]
    pub facebook: FileFacebookConfig,
    #[serde(default)]
    pub algolia: FileAlgoliaConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_cors: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_file_path: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCacheConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileStorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(default)]
    pub amazon_s3: FileAmazonS3Config,
    #[serde(default)]
    pub gcloud: FileGoogleCloudConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileAmazonS3Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileGoogleCloudConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_file_path: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileAuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileFacebookConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_access_token: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileAlgoliaConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Environment-derived configuration values.
///
/// Variable names are the command-line flag names upper-cased with `-`
/// replaced by `_`, e.g. `--mongodb-uri` reads `MONGODB_URI`.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub listen_address: Option<String>,
    pub allow_cors: Option<bool>,
    pub base_url: Option<String>,
    pub cache_file_path: Option<PathBuf>,
    pub static_file_path: Option<PathBuf>,
    pub mongodb_uri: Option<String>,
    pub db_name: Option<String>,
    pub storage_driver: Option<String>,
    pub amazon_s3_region: Option<String>,
    pub amazon_s3_bucket_name: Option<String>,
    pub amazon_s3_access_key: Option<String>,
    pub amazon_s3_secret_key: Option<String>,
    pub gcloud_bucket_name: Option<String>,
    pub gcloud_credentials_file_path: Option<PathBuf>,
    pub auth0_audience: Option<String>,
    pub auth0_issuer: Option<String>,
    pub auth0_jwks_uri: Option<String>,
    pub facebook_app_access_token: Option<String>,
    pub algolia_app_id: Option<String>,
    pub algolia_api_key: Option<String>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let path = |name: &str| var(name).map(PathBuf::from);

        Self {
            config_path: path("MYBLOG_CONFIG"),
            listen_address: var("LISTEN_ADDRESS"),
            allow_cors: var("ALLOW_CORS").and_then(|raw| parse_bool(&raw)),
            base_url: var("BASE_URL"),
            cache_file_path: path("CACHE_FILE_PATH"),
            static_file_path: path("STATIC_FILE_PATH"),
            mongodb_uri: var("MONGODB_URI"),
            db_name: var("DB_NAME"),
            storage_driver: var("STORAGE_DRIVER"),
            amazon_s3_region: var("AMAZON_S3_REGION"),
            amazon_s3_bucket_name: var("AMAZON_S3_BUCKET_NAME"),
            amazon_s3_access_key: var("AMAZON_S3_ACCESS_KEY"),
            amazon_s3_secret_key: var("AMAZON_S3_SECRET_KEY"),
            gcloud_bucket_name: var("GCLOUD_BUCKET_NAME"),
            gcloud_credentials_file_path: path("GCLOUD_CREDENTIALS_FILE_PATH"),
            auth0_audience: var("AUTH0_AUDIENCE"),
            auth0_issuer: var("AUTH0_ISSUER"),
            auth0_jwks_uri: var("AUTH0_JWKS_URI"),
            facebook_app_access_token: var("FACEBOOK_APP_ACCESS_TOKEN"),
            algolia_app_id: var("ALGOLIA_APP_ID"),
            algolia_api_key: var("ALGOLIA_API_KEY"),
        }
    }
    /// Layer `self` over `lower`: every value set here wins.
    pub fn or(self, lower: EnvConfig) -> EnvConfig {
        EnvConfig {
            config_path: self.config_path.or(lower.config_path),
            listen_address: self.listen_address.or(lower.listen_address),
            allow_cors: self.allow_cors.or(lower.allow_cors),
            base_url: self.base_url.or(lower.base_url),
            cache_file_path: self.cache_file_path.or(lower.cache_file_path),
            static_file_path: self.static_file_path.or(lower.static_file_path),
            mongodb_uri: self.mongodb_uri.or(lower.mongodb_uri),
            db_name: self.db_name.or(lower.db_name),
            storage_driver: self.storage_driver.or(lower.storage_driver),
            amazon_s3_region: self.amazon_s3_region.or(lower.amazon_s3_region),
            amazon_s3_bucket_name: self.amazon_s3_bucket_name.or(lower.amazon_s3_bucket_name),
            amazon_s3_access_key: self.amazon_s3_access_key.or(lower.amazon_s3_access_key),
            amazon_s3_secret_key: self.amazon_s3_secret_key.or(lower.amazon_s3_secret_key),
            gcloud_bucket_name: self.gcloud_bucket_name.or(lower.gcloud_bucket_name),
            gcloud_credentials_file_path: self.gcloud_credentials_file_path.or(lower.gcloud_credentials_file_path),
            auth0_audience: self.auth0_audience.or(lower.auth0_audience),
            auth0_issuer: self.auth0_issuer.or(lower.auth0_issuer),
            auth0_jwks_uri: self.auth0_jwks_uri.or(lower.auth0_jwks_uri),
            facebook_app_access_token: self.facebook_app_access_token.or(lower.facebook_app_access_token),
            algolia_app_id: self.algolia_app_id.or(lower.algolia_app_id),
            algolia_api_key: self.algolia_api_key.or(lower.algolia_api_key),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
