use std::{
    collections::HashMap,
    fmt,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use super::jwt::AuthError;

/// Resolves a signing key by its `kid` header.
#[async_trait]
pub trait KeySource: Send + Sync {
    async fn find(&self, kid: &str) -> Result<Option<Jwk>, AuthError>;
}

/// Upstream is asked again for an unknown `kid` at most this often.
pub const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Keys fetched from a remote JWKS document and kept by `kid`.
///
/// A miss triggers a refetch, unless the previous fetch happened less than
/// `min_refresh_interval` ago.
pub struct JwksKeySource {
    uri: String,
    client: reqwest::Client,
    keys: RwLock<HashMap<String, Jwk>>,
    last_refresh: Mutex<Option<Instant>>,
    min_refresh_interval: Duration,
}

impl fmt::Debug for JwksKeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwksKeySource")
            .field("uri", &self.uri)
            .finish_non_exhaustive()
    }
}

impl JwksKeySource {
    pub fn new(uri: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            uri: uri.into(),
            client,
            keys: RwLock::new(HashMap::new()),
            last_refresh: Mutex::new(None),
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
        }
    }

    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    async fn refresh(&self) -> Result<(), AuthError> {
        let set: JwkSet = self
            .client
            .get(&self.uri)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|err| AuthError::Jwks(err.to_string()))?
            .json()
            .await
            .map_err(|err| AuthError::Jwks(err.to_string()))?;

        let fetched: HashMap<String, Jwk> = set
            .keys
            .into_iter()
            .filter_map(|jwk| jwk.common.key_id.clone().map(|kid| (kid, jwk)))
            .collect();
        debug!(uri = %self.uri, keys = fetched.len(), "refreshed JWKS");

        *self.keys.write().await = fetched;
        Ok(())
    }
}

#[async_trait]
impl KeySource for JwksKeySource {
    async fn find(&self, kid: &str) -> Result<Option<Jwk>, AuthError> {
        if let Some(jwk) = self.keys.read().await.get(kid) {
            return Ok(Some(jwk.clone()));
        }

        // Held across the fetch so concurrent misses share one request.
        let mut last_refresh = self.last_refresh.lock().await;
        if let Some(jwk) = self.keys.read().await.get(kid) {
            return Ok(Some(jwk.clone()));
        }
        if let Some(at) = *last_refresh
            && at.elapsed() < self.min_refresh_interval
        {
            warn!(kid, "unknown key id, JWKS refetch throttled");
            return Ok(None);
        }

        *last_refresh = Some(Instant::now());
        self.refresh().await?;
        Ok(self.keys.read().await.get(kid).cloned())
    }
}

/// Fixed key set, for tests and offline setups.
#[derive(Debug, Default, Clone)]
pub struct StaticKeySource {
    keys: HashMap<String, Jwk>,
}

impl StaticKeySource {
    pub fn new(keys: impl IntoIterator<Item = Jwk>) -> Self {
        Self {
            keys: keys
                .into_iter()
                .filter_map(|jwk| jwk.common.key_id.clone().map(|kid| (kid, jwk)))
                .collect(),
        }
    }
}

#[async_trait]
impl KeySource for StaticKeySource {
    async fn find(&self, kid: &str) -> Result<Option<Jwk>, AuthError> {
        Ok(self.keys.get(kid).cloned())
    }
}
