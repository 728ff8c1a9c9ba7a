use std::{fmt, path::PathBuf, str::FromStr, sync::Arc};

use async_trait::async_trait;
use object_store::{
    ObjectStore, PutPayload, aws::AmazonS3Builder, gcp::GoogleCloudStorageBuilder,
    local::LocalFileSystem, path::Path as ObjectPath,
};
use tracing::info;

use super::Storage;
use crate::{BlogError, Result};

/// Which backend serves uploaded blobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageDriver {
    LocalDisk,
    AmazonS3,
    GoogleCloud,
}

impl FromStr for StorageDriver {
    type Err = BlogError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "local-disk" | "local" => Ok(Self::LocalDisk),
            "s3" => Ok(Self::AmazonS3),
            "gcloud" | "gcs" => Ok(Self::GoogleCloud),
            other => Err(BlogError::Validation(format!(
                "unsupported storage driver: {other}"
            ))),
        }
    }
}

impl fmt::Display for StorageDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LocalDisk => "local-disk",
            Self::AmazonS3 => "s3",
            Self::GoogleCloud => "gcloud",
        };
        f.write_str(name)
    }
}

/// [`Storage`] over any `object_store` backend.
#[derive(Clone)]
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    driver: StorageDriver,
}

impl fmt::Debug for ObjectStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStorage")
            .field("driver", &self.driver)
            .finish_non_exhaustive()
    }
}

impl ObjectStorage {
    pub fn local_disk(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        let store = LocalFileSystem::new_with_prefix(&root)?;
        info!(root = %root.display(), "using local disk storage");
        Ok(Self {
            store: Arc::new(store),
            driver: StorageDriver::LocalDisk,
        })
    }

    pub fn amazon_s3(
        region: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
    ) -> Result<Self> {
        let store = AmazonS3Builder::new()
            .with_region(region)
            .with_bucket_name(bucket)
            .with_access_key_id(access_key)
            .with_secret_access_key(secret_key)
            .build()?;
        info!(region, bucket, "using Amazon S3 storage");
        Ok(Self {
            store: Arc::new(store),
            driver: StorageDriver::AmazonS3,
        })
    }

    pub fn google_cloud(bucket: &str, credentials_path: &str) -> Result<Self> {
        let store = GoogleCloudStorageBuilder::new()
            .with_bucket_name(bucket)
            .with_service_account_path(credentials_path)
            .build()?;
        info!(bucket, "using Google Cloud Storage");
        Ok(Self {
            store: Arc::new(store),
            driver: StorageDriver::GoogleCloud,
        })
    }

    fn location(path: &str) -> Result<ObjectPath> {
        ObjectPath::parse(path)
            .map_err(|err| BlogError::Validation(format!("invalid storage path {path}: {err}")))
    }
}

#[async_trait]
impl Storage for ObjectStorage {
    async fn upload(&self, body: Vec<u8>, path: &str) -> Result<()> {
        let location = Self::location(path)?;
        self.store.put(&location, PutPayload::from(body)).await?;
        Ok(())
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>> {
        let location = Self::location(path)?;
        let bytes = self.store.get(&location).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let location = Self::location(path)?;
        self.store.delete(&location).await?;
        Ok(())
    }
}
