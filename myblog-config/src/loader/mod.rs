use once_cell::sync::Lazy;
use std::{fs, path::PathBuf};
use thiserror::Error;

use myblog_core::storage::StorageDriver;

use crate::{
    models::{
        AlgoliaConfig, AmazonS3Config, AuthConfig, CacheConfig, Config, ConfigMetadata,
        DatabaseConfig, FacebookConfig, GoogleCloudConfig, ServerConfig, StorageConfig,
        sources::{EnvConfig, FileConfig},
    },
    validation::{self, ConfigWarnings},
};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> =
    Lazy::new(|| vec![PathBuf::from("myblog.toml"), PathBuf::from("config/myblog.toml")]);

pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_BASE_URL: &str = "https://www.nomkhonwaan.com";
pub const DEFAULT_MONGODB_URI: &str = "mongodb://localhost/nomkhonwaan_com";
pub const DEFAULT_DB_NAME: &str = "nomkhonwaan_com";
pub const DEFAULT_S3_REGION: &str = "ap-southeast-1";
pub const DEFAULT_BUCKET_NAME: &str = "www-nomkhonwaan-com";
pub const DEFAULT_AUTH0_AUDIENCE: &str = "https://www.nomkhonwaan.com";
pub const DEFAULT_AUTH0_ISSUER: &str = "https://nomkhonwaan.auth0.com/";
pub const DEFAULT_AUTH0_JWKS_URI: &str = "https://nomkhonwaan.auth0.com/.well-known/jwks.json";

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    /// Command-line values, layered above the environment.
    pub overrides: EnvConfig,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    /// Values that take precedence over the environment and the file.
    pub fn with_overrides(mut self, overrides: EnvConfig) -> Self {
        self.options.overrides = overrides;
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = dotenvy::dotenv().map(|_| true).or_else(|err| match err {
            dotenvy::Error::Io(_) => Ok(false),
            _ => Err(err),
        })?;

        self.load_with_env(EnvConfig::gather(), env_file_loaded)
    }

    /// Compose a configuration from an already gathered environment.
    ///
    /// Precedence is overrides, then `env`, then the file, then defaults.
    /// Validation runs once, on the merged result.
    pub fn load_with_env(
        &self,
        env: EnvConfig,
        env_file_loaded: bool,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let env = self.options.overrides.clone().or(env);
        let (file_config, config_path) = self.load_file_config(&env)?;
        let (config, warnings) = compose_config(file_config, env, config_path, env_file_loaded)?;
        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        let path = match explicit {
            Some(path) if !path.exists() => return Err(ConfigLoadError::MissingConfig { path }),
            Some(path) => path,
            None => match DEFAULT_CONFIG_LOCATIONS.iter().find(|candidate| candidate.exists()) {
                Some(found) => found.clone(),
                None => return Ok((None, None)),
            },
        };

        let contents = fs::read_to_string(&path).map_err(|source| ConfigLoadError::Io {
            path: path.clone(),
            source,
        })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
                path: path.clone(),
                source,
            })?;

        Ok((Some(file_config), Some(path)))
    }
}

fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    config_path: Option<PathBuf>,
    env_file_loaded: bool,
) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    if config_path.is_none() {
        warnings.push_with_hint(
            "No myblog.toml detected; using environment variables and defaults",
            "Create myblog.toml or set MYBLOG_CONFIG to point at one",
        );
    }

    let FileConfig {
        server: file_server,
        database: file_database,
        cache: file_cache,
        storage: file_storage,
        auth: file_auth,
        facebook: file_facebook,
        algolia: file_algolia,
    } = file_config.unwrap_or_default();

    let cwd = std::env::current_dir().map_err(|source| ConfigLoadError::Io {
        path: PathBuf::from("."),
        source,
    })?;

    let server = ServerConfig {
        listen_address: env
            .listen_address
            .or(file_server.listen_address)
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDRESS.to_string()),
        allow_cors: env.allow_cors.or(file_server.allow_cors).unwrap_or(false),
        base_url: env
            .base_url
            .or(file_server.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        static_file_path: env
            .static_file_path
            .or(file_server.static_file_path)
            .unwrap_or_else(|| cwd.join("dist").join("web")),
    };

    let database = DatabaseConfig {
        uri: env
            .mongodb_uri
            .or(file_database.uri)
            .unwrap_or_else(|| DEFAULT_MONGODB_URI.to_string()),
        name: env
            .db_name
            .or(file_database.name)
            .unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
    };

    let cache = CacheConfig {
        root: env
            .cache_file_path
            .or(file_cache.root)
            .unwrap_or_else(|| cwd.join(".cache")),
    };

    let driver = match env.storage_driver.or(file_storage.driver) {
        Some(raw) => raw
            .parse::<StorageDriver>()
            .map_err(|err| ConfigLoadError::Invalid(err.to_string()))?,
        None => StorageDriver::LocalDisk,
    };
    let file_s3 = file_storage.amazon_s3;
    let file_gcloud = file_storage.gcloud;
    let storage = StorageConfig {
        driver,
        amazon_s3: AmazonS3Config {
            region: env
                .amazon_s3_region
                .or(file_s3.region)
                .unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
            bucket_name: env
                .amazon_s3_bucket_name
                .or(file_s3.bucket_name)
                .unwrap_or_else(|| DEFAULT_BUCKET_NAME.to_string()),
            access_key: env.amazon_s3_access_key.or(file_s3.access_key),
            secret_key: env.amazon_s3_secret_key.or(file_s3.secret_key),
        },
        gcloud: GoogleCloudConfig {
            bucket_name: env
                .gcloud_bucket_name
                .or(file_gcloud.bucket_name)
                .unwrap_or_else(|| DEFAULT_BUCKET_NAME.to_string()),
            credentials_file_path: env
                .gcloud_credentials_file_path
                .or(file_gcloud.credentials_file_path),
        },
    };

    let auth = AuthConfig {
        audience: env
            .auth0_audience
            .or(file_auth.audience)
            .unwrap_or_else(|| DEFAULT_AUTH0_AUDIENCE.to_string()),
        issuer: env
            .auth0_issuer
            .or(file_auth.issuer)
            .unwrap_or_else(|| DEFAULT_AUTH0_ISSUER.to_string()),
        jwks_uri: env
            .auth0_jwks_uri
            .or(file_auth.jwks_uri)
            .unwrap_or_else(|| DEFAULT_AUTH0_JWKS_URI.to_string()),
    };

    let facebook = FacebookConfig {
        app_access_token: env
            .facebook_app_access_token
            .or(file_facebook.app_access_token),
    };

    let algolia = AlgoliaConfig {
        app_id: env.algolia_app_id.or(file_algolia.app_id),
        api_key: env.algolia_api_key.or(file_algolia.api_key),
    };

    let config = Config {
        server,
        database,
        cache,
        storage,
        auth,
        facebook,
        algolia,
        metadata: ConfigMetadata {
            config_path,
            env_file_loaded,
        },
    };

    warnings.extend(validation::check(&config).map_err(ConfigLoadError::Invalid)?);

    Ok((config, warnings))
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}
