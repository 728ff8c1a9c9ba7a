use std::{fmt, sync::Arc};

use myblog_core::{
    Repositories,
    image::Resizer,
    storage::{Cache, DownloadPipeline, Storage},
};

use crate::{
    auth::{JwtVerifier, KeySource},
    graphql::{self, BlogSchema, engagement::GraphApiClient},
    infra::config::Config,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub repositories: Repositories,
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn Cache>,
    pub pipeline: DownloadPipeline,
    pub verifier: Arc<JwtVerifier>,
    pub schema: BlogSchema,
    pub http: reqwest::Client,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("base_url", &self.config.base_url())
            .finish_non_exhaustive()
    }
}

/// Collaborators the server is assembled from. Production wires MongoDB,
/// object storage and the remote JWKS; tests substitute in-memory fakes.
pub struct AppParts {
    pub config: Config,
    pub repositories: Repositories,
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn Cache>,
    pub resizer: Arc<dyn Resizer>,
    pub keys: Arc<dyn KeySource>,
    pub http: reqwest::Client,
}

impl fmt::Debug for AppParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppParts").finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(parts: AppParts) -> Self {
        let AppParts {
            config,
            repositories,
            storage,
            cache,
            resizer,
            keys,
            http,
        } = parts;

        let verifier = JwtVerifier::new(config.auth.audience.clone(), config.auth.issuer.clone(), keys);
        let engagement = GraphApiClient::new(config.facebook.app_access_token.clone(), http.clone());
        let schema = graphql::build_schema(
            repositories.clone(),
            Arc::new(engagement),
            config.base_url().to_string(),
        );
        let pipeline = DownloadPipeline::new(storage.clone(), cache.clone(), resizer);

        Self {
            config: Arc::new(config),
            repositories,
            storage,
            cache,
            pipeline,
            verifier: Arc::new(verifier),
            schema,
            http,
        }
    }

    pub fn with_verifier(mut self, verifier: JwtVerifier) -> Self {
        self.verifier = Arc::new(verifier);
        self
    }

    pub fn base_url(&self) -> &str {
        self.config.base_url()
    }
}
