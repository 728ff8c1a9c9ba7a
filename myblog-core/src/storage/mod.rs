//! Blob storage, the disk cache in front of it, and the download pipeline that
//! ties both to the resizer.

pub mod cache;
pub mod object;
pub mod pipeline;

use std::path::Path;

use async_trait::async_trait;

use crate::Result;

pub use cache::{Cache, DiskCache};
pub use object::{ObjectStorage, StorageDriver};
pub use pipeline::{Download, DownloadPipeline, ResizeRequest};

/// Port for the backing blob store, keyed by catalog `path`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Storage: Send + Sync {
    async fn upload(&self, body: Vec<u8>, path: &str) -> Result<()>;
    async fn download(&self, path: &str) -> Result<Vec<u8>>;
    async fn delete(&self, path: &str) -> Result<()>;
}

/// Content type derived from the file extension.
pub fn mime_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("pdf") => "application/pdf",
        Some("json") => "application/json",
        Some("xml") => "text/xml; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("txt" | "md") => "text/plain; charset=utf-8",
        Some("mp4") => "video/mp4",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_for_recognises_images_case_insensitively() {
        assert_eq!(mime_for("auth0|1/photo-abc.JPG"), "image/jpeg");
        assert_eq!(mime_for("photo.png"), "image/png");
        assert_eq!(mime_for("archive"), "application/octet-stream");
    }
}
