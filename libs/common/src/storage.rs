//! Blob storage for uploaded avatars and photos
//!
//! The core only keeps the reference returned by [`BlobStorage::put`]; it
//! never reads blobs back.

use aws_config::BehaviorVersion;
use aws_sdk_s3::{Client, primitives::ByteStream};
use std::path::{Component, Path, PathBuf};
use tracing::info;

use crate::error::StorageError;

/// Blob storage configuration
#[derive(Debug, Clone, PartialEq)]
pub enum StorageConfig {
    /// Files written below `root`, served from `public_url`
    Local { root: PathBuf, public_url: String },
    /// Objects written to an S3 bucket
    S3 { bucket: String },
}

impl StorageConfig {
    /// Create a new StorageConfig from environment variables
    ///
    /// # Environment Variables
    /// - `STORAGE_BACKEND`: `local` or `s3` (default: `local`)
    /// - `STORAGE_LOCAL_ROOT`: Directory for the local backend (default: `./media`)
    /// - `STORAGE_PUBLIC_URL`: URL prefix for local references (default: `/media`)
    /// - `STORAGE_BUCKET`: Bucket name, required for the `s3` backend
    pub fn from_env() -> Result<Self, StorageError> {
        let backend = std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "local".to_string());

        match backend.as_str() {
            "local" => Ok(StorageConfig::Local {
                root: std::env::var("STORAGE_LOCAL_ROOT")
                    .unwrap_or_else(|_| "./media".to_string())
                    .into(),
                public_url: std::env::var("STORAGE_PUBLIC_URL")
                    .unwrap_or_else(|_| "/media".to_string()),
            }),
            "s3" => {
                let bucket = std::env::var("STORAGE_BUCKET").map_err(|_| {
                    StorageError::Configuration(
                        "STORAGE_BUCKET environment variable not set".to_string(),
                    )
                })?;
                Ok(StorageConfig::S3 { bucket })
            }
            other => Err(StorageError::Configuration(format!(
                "Unknown storage backend: {}",
                other
            ))),
        }
    }
}

/// Local filesystem backend
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_url: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
        let target = self.root.join(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;

        Ok(format!("{}/{}", self.public_url, path))
    }
}

/// S3 backend
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        Ok(format!("s3://{}/{}", self.bucket, path))
    }
}

/// Blob storage used for avatar and photo uploads
#[derive(Clone)]
pub enum BlobStorage {
    Local(LocalStorage),
    S3(S3Storage),
}

impl BlobStorage {
    /// Build the configured backend
    pub async fn from_config(config: &StorageConfig) -> Self {
        match config {
            StorageConfig::Local { root, public_url } => {
                info!("Using local blob storage at {}", root.display());
                BlobStorage::Local(LocalStorage::new(root.clone(), public_url.clone()))
            }
            StorageConfig::S3 { bucket } => {
                info!("Using S3 blob storage in bucket {}", bucket);
                let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
                BlobStorage::S3(S3Storage::new(Client::new(&aws_config), bucket.clone()))
            }
        }
    }

    /// Store `bytes` under `path` and return the reference to keep
    pub async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        validate_path(path)?;
        info!("Storing blob {} ({} bytes)", path, bytes.len());

        match self {
            BlobStorage::Local(local) => local.put(path, bytes).await,
            BlobStorage::S3(s3) => s3.put(path, bytes, content_type).await,
        }
    }
}

fn validate_path(path: &str) -> Result<(), StorageError> {
    let parsed = Path::new(path);
    let plain = !path.is_empty()
        && parsed
            .components()
            .all(|component| matches!(component, Component::Normal(_)));

    if plain {
        Ok(())
    } else {
        Err(StorageError::InvalidPath(path.to_string()))
    }
}
