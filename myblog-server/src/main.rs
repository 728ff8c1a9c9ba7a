//! # myblog server
//!
//! Entry point of the blog backend: `serve` (the default) runs the HTTP
//! server, `generate-indices` rebuilds the Algolia search index.

use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand, builder::BoolishValueParser};
use mongodb::bson::doc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use myblog_core::{
    Repositories,
    image::LanczosResizer,
    storage::{
        DiskCache, ObjectStorage, Storage, StorageDriver,
        cache::{DEFAULT_CACHE_TTL, DEFAULT_SWEEP_INTERVAL},
    },
};
use myblog_server::{
    AppState,
    auth::JwksKeySource,
    create_app,
    infra::{
        app_state::AppParts,
        http,
        config::{Config, ConfigLoad, ConfigLoader, models::sources::EnvConfig},
    },
    jobs::algolia::{self, AlgoliaClient},
};

/// In-flight requests get this long to finish after the first signal.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5 * 60);

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "myblog-server")]
#[command(about = "Personal blog backend serving GraphQL, storage and the web app")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Rebuild the Algolia search index and exit
    GenerateIndices,
}

#[derive(ClapArgs, Debug, Clone, Default)]
struct ServeArgs {
    /// Path to a TOML configuration file
    #[arg(long, env = "MYBLOG_CONFIG")]
    config: Option<PathBuf>,

    /// Address the HTTP server binds to
    #[arg(long, env = "LISTEN_ADDRESS")]
    listen_address: Option<String>,

    /// Add permissive CORS headers to every response
    #[arg(long, env = "ALLOW_CORS", value_parser = BoolishValueParser::new())]
    allow_cors: Option<bool>,

    /// Public URL of the site
    #[arg(long, env = "BASE_URL")]
    base_url: Option<String>,

    /// Directory of the disk cache
    #[arg(long, env = "CACHE_FILE_PATH")]
    cache_file_path: Option<PathBuf>,

    /// Directory of the single-page web build
    #[arg(long, env = "STATIC_FILE_PATH")]
    static_file_path: Option<PathBuf>,

    #[arg(long, env = "MONGODB_URI")]
    mongodb_uri: Option<String>,

    #[arg(long, env = "DB_NAME")]
    db_name: Option<String>,

    /// One of local-disk, s3 or gcloud
    #[arg(long, env = "STORAGE_DRIVER")]
    storage_driver: Option<String>,

    #[arg(long, env = "AMAZON_S3_REGION")]
    amazon_s3_region: Option<String>,

    #[arg(long, env = "AMAZON_S3_BUCKET_NAME")]
    amazon_s3_bucket_name: Option<String>,

    #[arg(long, env = "AMAZON_S3_ACCESS_KEY", hide_env_values = true)]
    amazon_s3_access_key: Option<String>,

    #[arg(long, env = "AMAZON_S3_SECRET_KEY", hide_env_values = true)]
    amazon_s3_secret_key: Option<String>,

    #[arg(long, env = "GCLOUD_BUCKET_NAME")]
    gcloud_bucket_name: Option<String>,

    #[arg(long, env = "GCLOUD_CREDENTIALS_FILE_PATH")]
    gcloud_credentials_file_path: Option<PathBuf>,

    #[arg(long, env = "AUTH0_AUDIENCE")]
    auth0_audience: Option<String>,

    #[arg(long, env = "AUTH0_ISSUER")]
    auth0_issuer: Option<String>,

    #[arg(long, env = "AUTH0_JWKS_URI")]
    auth0_jwks_uri: Option<String>,

    #[arg(long, env = "FACEBOOK_APP_ACCESS_TOKEN", hide_env_values = true)]
    facebook_app_access_token: Option<String>,

    #[arg(long, env = "ALGOLIA_APP_ID")]
    algolia_app_id: Option<String>,

    #[arg(long, env = "ALGOLIA_API_KEY", hide_env_values = true)]
    algolia_api_key: Option<String>,
}

impl ServeArgs {
    /// Flags as the top configuration layer, above the environment and file.
    fn overrides(&self) -> EnvConfig {
        EnvConfig {
            config_path: self.config.clone(),
            listen_address: self.listen_address.clone(),
            allow_cors: self.allow_cors,
            base_url: self.base_url.clone(),
            cache_file_path: self.cache_file_path.clone(),
            static_file_path: self.static_file_path.clone(),
            mongodb_uri: self.mongodb_uri.clone(),
            db_name: self.db_name.clone(),
            storage_driver: self.storage_driver.clone(),
            amazon_s3_region: self.amazon_s3_region.clone(),
            amazon_s3_bucket_name: self.amazon_s3_bucket_name.clone(),
            amazon_s3_access_key: self.amazon_s3_access_key.clone(),
            amazon_s3_secret_key: self.amazon_s3_secret_key.clone(),
            gcloud_bucket_name: self.gcloud_bucket_name.clone(),
            gcloud_credentials_file_path: self.gcloud_credentials_file_path.clone(),
            auth0_audience: self.auth0_audience.clone(),
            auth0_issuer: self.auth0_issuer.clone(),
            auth0_jwks_uri: self.auth0_jwks_uri.clone(),
            facebook_app_access_token: self.facebook_app_access_token.clone(),
            algolia_app_id: self.algolia_app_id.clone(),
            algolia_api_key: self.algolia_api_key.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_runtime_config(&cli.serve)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(config).await,
        Command::GenerateIndices => run_generate_indices(config).await,
    }
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<Config> {
    let ConfigLoad { config, warnings } = ConfigLoader::new()
        .with_overrides(args.overrides())
        .load()
        .context("failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!("loaded configuration from {}", path.display());
    }
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => warn!("{} ({hint})", warning.message),
            None => warn!("{}", warning.message),
        }
    }

    Ok(config)
}

async fn connect_repositories(config: &Config) -> anyhow::Result<Repositories> {
    let client = mongodb::Client::with_uri_str(&config.database.uri)
        .await
        .context("failed to create MongoDB client")?;
    let db = client.database(&config.database.name);
    db.run_command(doc! { "ping": 1 })
        .await
        .context("failed to reach MongoDB")?;
    info!(database = %config.database.name, "connected to MongoDB");
    Ok(Repositories::mongo(&db))
}

fn build_storage(config: &Config) -> anyhow::Result<Arc<dyn Storage>> {
    let storage = match config.storage.driver {
        StorageDriver::LocalDisk => ObjectStorage::local_disk(config.cache_root()),
        StorageDriver::AmazonS3 => {
            let s3 = &config.storage.amazon_s3;
            let (Some(access_key), Some(secret_key)) = (&s3.access_key, &s3.secret_key) else {
                anyhow::bail!("the s3 storage driver requires an access key and a secret key");
            };
            ObjectStorage::amazon_s3(&s3.region, &s3.bucket_name, access_key, secret_key)
        }
        StorageDriver::GoogleCloud => {
            let gcloud = &config.storage.gcloud;
            let Some(credentials) = &gcloud.credentials_file_path else {
                anyhow::bail!("the gcloud storage driver requires a credentials file");
            };
            ObjectStorage::google_cloud(&gcloud.bucket_name, &credentials.to_string_lossy())
        }
    }
    .with_context(|| format!("failed to initialise {} storage", config.storage.driver))?;
    Ok(Arc::new(storage))
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    let repositories = connect_repositories(&config).await?;
    let storage = build_storage(&config)?;

    let cache = DiskCache::new(config.cache_root());
    cache
        .ensure_root()
        .await
        .context("failed to create cache directory")?;
    let shutdown = CancellationToken::new();
    let sweeper = cache.spawn_sweeper(DEFAULT_CACHE_TTL, DEFAULT_SWEEP_INTERVAL, shutdown.clone());

    let http = http::upstream_client().context("failed to build HTTP client")?;
    let keys = JwksKeySource::new(config.auth.jwks_uri.clone(), http.clone());
    let listen_address = config.server.listen_address.clone();

    let state = AppState::new(AppParts {
        config,
        repositories,
        storage,
        cache: Arc::new(cache),
        resizer: Arc::new(LanczosResizer::new()),
        keys: Arc::new(keys),
        http,
    });
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&listen_address)
        .await
        .with_context(|| format!("failed to bind {listen_address}"))?;
    info!("listening on {listen_address}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
    .await
    .context("server error")?;

    shutdown.cancel();
    let _ = sweeper.await;
    info!("server stopped");
    Ok(())
}

async fn run_generate_indices(config: Config) -> anyhow::Result<()> {
    let Some((app_id, api_key)) = config.algolia.credentials() else {
        anyhow::bail!("generate-indices requires --algolia-app-id and --algolia-api-key");
    };
    let http = http::upstream_client().context("failed to build HTTP client")?;
    let client = AlgoliaClient::new(http, app_id, api_key);
    let repositories = connect_repositories(&config).await?;

    algolia::generate_indices(&client, &repositories, algolia::INDEX_NAME)
        .await
        .context("failed to generate algolia indices")?;
    info!("algolia indices generated");
    Ok(())
}

/// Resolves on the first SIGINT/SIGTERM. From then on a second signal
/// exits with code 1 and the grace period exits with code 0.
async fn shutdown_signal(token: CancellationToken) {
    wait_for_signal().await;
    info!(
        "shutting down, waiting up to {}s for in-flight requests",
        SHUTDOWN_GRACE_PERIOD.as_secs()
    );
    token.cancel();

    tokio::spawn(async {
        tokio::select! {
            _ = wait_for_signal() => {
                warn!("received second signal, exiting immediately");
                std::process::exit(1);
            }
            _ = tokio::time::sleep(SHUTDOWN_GRACE_PERIOD) => {
                warn!("graceful shutdown deadline exceeded");
                std::process::exit(0);
            }
        }
    });
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("unable to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!("unable to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
