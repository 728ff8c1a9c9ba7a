use std::{
    path::{Component, Path, PathBuf},
    time::{Duration, SystemTime},
};

use async_trait::async_trait;
use tokio::{io::AsyncWriteExt, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::{BlogError, Result};

/// How long a cached file lives before the sweeper removes it.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7);
/// Pause between two sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Nearest place the application can store and retrieve bytes quickly.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Cache: Send + Sync {
    async fn exists(&self, key: &str) -> bool;
    async fn retrieve(&self, key: &str) -> Result<Vec<u8>>;
    async fn store(&self, body: &[u8], key: &str) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Plain filesystem mirror keyed by relative path.
#[derive(Clone, Debug)]
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|err| {
            BlogError::Internal(format!(
                "failed to create cache dir {:?}: {err}",
                self.root
            ))
        })
    }

    /// Resolve `key` under the root, refusing anything that would escape it.
    pub fn path_for_key(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(BlogError::Validation(format!("invalid cache key: {key}")));
        }
        Ok(self.root.join(relative))
    }

    /// Remove every file whose modification time is older than `ttl`.
    pub async fn sweep_expired(&self, ttl: Duration) -> Result<usize> {
        let mut removed = 0;
        let mut pending = vec![self.root.clone()];
        let now = SystemTime::now();

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let metadata = entry.metadata().await?;
                if metadata.is_dir() {
                    pending.push(entry.path());
                    continue;
                }

                let age = metadata
                    .modified()
                    .ok()
                    .and_then(|modified| now.duration_since(modified).ok())
                    .unwrap_or_default();
                if age >= ttl {
                    info!(path = %entry.path().display(), "deleting expired cache file");
                    tokio::fs::remove_file(entry.path()).await?;
                    removed += 1;
                }
            }
        }

        Ok(removed)
    }

    /// Periodically sweep expired files until `cancel` fires.
    pub fn spawn_sweeper(
        &self,
        ttl: Duration,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            loop {
                if let Err(err) = cache.sweep_expired(ttl).await {
                    error!("unable to delete some cache files: {err}");
                }

                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("cache sweeper stopped");
                        return;
                    }
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        })
    }
}

#[async_trait]
impl Cache for DiskCache {
    async fn exists(&self, key: &str) -> bool {
        match self.path_for_key(key) {
            Ok(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn retrieve(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for_key(key)?;
        tokio::fs::read(&path).await.map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => BlogError::NotFound(format!("cache entry {key}")),
            _ => BlogError::Internal(format!("failed to read cache file {path:?}: {err}")),
        })
    }

    /// Atomic write (tmp + rename) so readers never observe a partial file.
    async fn store(&self, body: &[u8], key: &str) -> Result<()> {
        let path = self.path_for_key(key)?;
        let dir = path.parent().unwrap_or(&self.root).to_path_buf();
        tokio::fs::create_dir_all(&dir).await.map_err(|err| {
            BlogError::Internal(format!("failed to create cache dir {dir:?}: {err}"))
        })?;

        let tmp = dir.join(format!(".tmp-{}", Uuid::new_v4().simple()));
        let mut file = tokio::fs::File::create(&tmp).await.map_err(|err| {
            BlogError::Internal(format!("failed to create temp cache file {tmp:?}: {err}"))
        })?;
        file.write_all(body).await.map_err(|err| {
            BlogError::Internal(format!("failed to write temp cache file {tmp:?}: {err}"))
        })?;
        file.flush().await.map_err(|err| {
            BlogError::Internal(format!("failed to flush temp cache file {tmp:?}: {err}"))
        })?;
        drop(file);

        if let Err(err) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(BlogError::Internal(format!(
                "failed to move cache file {tmp:?} -> {path:?}: {err}"
            )));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for_key(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
