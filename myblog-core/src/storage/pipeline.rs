use std::{fmt, path::Path, sync::Arc};

use tracing::{debug, error, warn};

use super::{Cache, Storage, mime_for};
use crate::{BlogError, Result, domain::File, image::Resizer};

/// Requested output size; zero on both sides means "original".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResizeRequest {
    pub width: u32,
    pub height: u32,
}

impl ResizeRequest {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_requested(&self) -> bool {
        self.width > 0 || self.height > 0
    }
}

/// Bytes ready to be served together with their content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub body: Vec<u8>,
    pub content_type: &'static str,
}

/// Cache check, backing-store fetch, optional resize and write-back.
///
/// Cache writes are best effort: a failure is logged and the freshly fetched
/// bytes are still served. A failed resize falls back to the original bytes.
#[derive(Clone)]
pub struct DownloadPipeline {
    storage: Arc<dyn Storage>,
    cache: Arc<dyn Cache>,
    resizer: Arc<dyn Resizer>,
}

impl fmt::Debug for DownloadPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadPipeline").finish_non_exhaustive()
    }
}

/// Cache key of a resized variant: `{path without ext}-{w}-{h}{ext}`.
pub fn resized_key(path: &str, size: ResizeRequest) -> String {
    let ext = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    let stem = &path[..path.len() - ext.len()];
    format!("{stem}-{}-{}{ext}", size.width, size.height)
}

impl DownloadPipeline {
    pub fn new(
        storage: Arc<dyn Storage>,
        cache: Arc<dyn Cache>,
        resizer: Arc<dyn Resizer>,
    ) -> Self {
        Self {
            storage,
            cache,
            resizer,
        }
    }

    pub async fn fetch(&self, file: &File, size: ResizeRequest) -> Result<Download> {
        let path = file.path.as_str();
        let content_type = mime_for(path);
        let resizable = matches!(content_type, "image/jpeg" | "image/png");

        let resized = (resizable && size.is_requested()).then(|| resized_key(path, size));

        if let Some(key) = &resized
            && self.cache.exists(key).await
        {
            match self.cache.retrieve(key).await {
                Ok(body) => {
                    debug!(key, "serving resized variant from cache");
                    return Ok(Download { body, content_type });
                }
                Err(err) => error!("unable to retrieve file from {key}: {err}"),
            }
        }

        let original = self.fetch_original(path).await?;

        let Some(key) = resized else {
            return Ok(Download {
                body: original,
                content_type,
            });
        };

        let body = match self.resize(original.clone(), size).await {
            Ok(body) => body,
            Err(err) => {
                warn!("unable to resize image {path}: {err}");
                return Ok(Download {
                    body: original,
                    content_type,
                });
            }
        };

        if let Err(err) = self.cache.store(&body, &key).await {
            error!("unable to store file on {key}: {err}");
        }

        Ok(Download { body, content_type })
    }

    /// Lanczos resampling is CPU bound, so it runs on the blocking pool.
    async fn resize(&self, source: Vec<u8>, size: ResizeRequest) -> Result<Vec<u8>> {
        let resizer = Arc::clone(&self.resizer);
        tokio::task::spawn_blocking(move || resizer.resize(&source, size.width, size.height))
            .await
            .map_err(|err| BlogError::Internal(format!("Failed to join resize task: {err}")))?
    }

    async fn fetch_original(&self, path: &str) -> Result<Vec<u8>> {
        if self.cache.exists(path).await {
            match self.cache.retrieve(path).await {
                Ok(body) => return Ok(body),
                Err(err) => error!("unable to retrieve file from {path}: {err}"),
            }
        }

        let body = self.storage.download(path).await.map_err(|err| match err {
            BlogError::NotFound(_) => err,
            other => BlogError::NotFound(format!("{path}: {other}")),
        })?;

        if let Err(err) = self.cache.store(&body, path).await {
            error!("unable to store file on {path}: {err}");
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        image::MockResizer,
        storage::{MockStorage, cache::MockCache},
    };
    use mongodb::bson::oid::ObjectId;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    fn png_file() -> File {
        File::new(ObjectId::new(), "auth0|1/photo-abc.png", "photo.png", "photo-abc.png")
    }

    fn pipeline(storage: MockStorage, cache: MockCache, resizer: MockResizer) -> DownloadPipeline {
        DownloadPipeline::new(Arc::new(storage), Arc::new(cache), Arc::new(resizer))
    }

    #[test]
    fn resized_key_keeps_extension_last() {
        assert_eq!(
            resized_key("auth0|1/photo-abc.png", ResizeRequest::new(10, 0)),
            "auth0|1/photo-abc-10-0.png"
        );
        assert_eq!(resized_key("noext", ResizeRequest::new(1, 2)), "noext-1-2");
    }

    #[tokio::test]
    async fn cached_resized_variant_never_touches_storage() {
        let mut storage = MockStorage::new();
        storage.expect_download().never();

        let mut cache = MockCache::new();
        cache
            .expect_exists()
            .withf(|key| key == "auth0|1/photo-abc-10-10.png")
            .return_const(true);
        cache
            .expect_retrieve()
            .withf(|key| key == "auth0|1/photo-abc-10-10.png")
            .returning(|_| Ok(b"resized".to_vec()));

        let mut resizer = MockResizer::new();
        resizer.expect_resize().never();

        let download = pipeline(storage, cache, resizer)
            .fetch(&png_file(), ResizeRequest::new(10, 10))
            .await
            .expect("fetch");

        assert_eq!(download.body, b"resized");
        assert_eq!(download.content_type, "image/png");
    }

    #[tokio::test]
    async fn cache_miss_downloads_stores_and_resizes() {
        let mut storage = MockStorage::new();
        storage
            .expect_download()
            .withf(|key| key == "auth0|1/photo-abc.png")
            .times(1)
            .returning(|_| Ok(b"original".to_vec()));

        let mut cache = MockCache::new();
        cache.expect_exists().return_const(false);
        cache
            .expect_store()
            .withf(|body, key| key == "auth0|1/photo-abc.png" && body == b"original")
            .times(1)
            .returning(|_, _| Ok(()));
        cache
            .expect_store()
            .withf(|body, key| key == "auth0|1/photo-abc-10-0.png" && body == b"small")
            .times(1)
            .returning(|_, _| Ok(()));

        let mut resizer = MockResizer::new();
        resizer
            .expect_resize()
            .withf(|data, w, h| data == b"original" && *w == 10 && *h == 0)
            .returning(|_, _, _| Ok(b"small".to_vec()));

        let download = pipeline(storage, cache, resizer)
            .fetch(&png_file(), ResizeRequest::new(10, 0))
            .await
            .expect("fetch");

        assert_eq!(download.body, b"small");
    }

    #[tokio::test]
    async fn resize_failure_serves_original_bytes() {
        let mut storage = MockStorage::new();
        storage
            .expect_download()
            .returning(|_| Ok(b"original".to_vec()));

        let mut cache = MockCache::new();
        cache.expect_exists().return_const(false);
        cache.expect_store().returning(|_, _| Ok(()));

        let mut resizer = MockResizer::new();
        resizer
            .expect_resize()
            .returning(|_, _, _| Err(BlogError::Internal("corrupt".into())));

        let download = pipeline(storage, cache, resizer)
            .fetch(&png_file(), ResizeRequest::new(10, 10))
            .await
            .expect("fetch");

        assert_eq!(download.body, b"original");
    }

    #[tokio::test]
    async fn resize_does_not_stall_other_tasks() {
        let mut storage = MockStorage::new();
        storage
            .expect_download()
            .returning(|_| Ok(b"original".to_vec()));

        let mut cache = MockCache::new();
        cache.expect_exists().return_const(false);
        cache.expect_store().returning(|_, _| Ok(()));

        let mut resizer = MockResizer::new();
        resizer.expect_resize().returning(|_, _, _| {
            std::thread::sleep(Duration::from_millis(200));
            Ok(b"small".to_vec())
        });

        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = {
            let ticks = Arc::clone(&ticks);
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    ticks.fetch_add(1, Ordering::Relaxed);
                }
            })
        };

        let download = pipeline(storage, cache, resizer)
            .fetch(&png_file(), ResizeRequest::new(10, 10))
            .await
            .expect("fetch");
        ticker.abort();

        assert_eq!(download.body, b"small");
        assert!(ticks.load(Ordering::Relaxed) > 0, "runtime was blocked during resize");
    }

    #[tokio::test]
    async fn resize_panic_serves_original_bytes() {
        let mut storage = MockStorage::new();
        storage
            .expect_download()
            .returning(|_| Ok(b"original".to_vec()));

        let mut cache = MockCache::new();
        cache.expect_exists().return_const(false);
        cache.expect_store().returning(|_, _| Ok(()));

        struct PanickingResizer;

        impl Resizer for PanickingResizer {
            fn resize(&self, _: &[u8], _: u32, _: u32) -> Result<Vec<u8>> {
                panic!("decoder exploded")
            }
        }

        let pipeline =
            DownloadPipeline::new(Arc::new(storage), Arc::new(cache), Arc::new(PanickingResizer));
        let download = pipeline
            .fetch(&png_file(), ResizeRequest::new(10, 10))
            .await
            .expect("fetch");

        assert_eq!(download.body, b"original");
    }

    #[tokio::test]
    async fn cache_write_failure_is_not_fatal() {
        let mut storage = MockStorage::new();
        storage
            .expect_download()
            .returning(|_| Ok(b"original".to_vec()));

        let mut cache = MockCache::new();
        cache.expect_exists().return_const(false);
        cache
            .expect_store()
            .returning(|_, _| Err(BlogError::Internal("disk full".into())));

        let download = pipeline(storage, cache, MockResizer::new())
            .fetch(&png_file(), ResizeRequest::default())
            .await
            .expect("fetch");

        assert_eq!(download.body, b"original");
    }

    #[tokio::test]
    async fn non_image_ignores_resize_request() {
        let file = File::new(ObjectId::new(), "auth0|1/notes-abc.pdf", "notes.pdf", "notes-abc.pdf");

        let mut cache = MockCache::new();
        cache
            .expect_exists()
            .withf(|key| key == "auth0|1/notes-abc.pdf")
            .return_const(true);
        cache
            .expect_retrieve()
            .returning(|_| Ok(b"%PDF".to_vec()));

        let mut resizer = MockResizer::new();
        resizer.expect_resize().never();

        let download = pipeline(MockStorage::new(), cache, resizer)
            .fetch(&file, ResizeRequest::new(100, 100))
            .await
            .expect("fetch");

        assert_eq!(download.content_type, "application/pdf");
        assert_eq!(download.body, b"%PDF");
    }

    #[tokio::test]
    async fn storage_failure_is_not_found() {
        let mut storage = MockStorage::new();
        storage
            .expect_download()
            .returning(|_| Err(BlogError::Upstream("bucket unavailable".into())));

        let mut cache = MockCache::new();
        cache.expect_exists().return_const(false);

        let err = pipeline(storage, cache, MockResizer::new())
            .fetch(&png_file(), ResizeRequest::default())
            .await
            .expect_err("missing blob");

        assert!(err.is_not_found());
    }
}
