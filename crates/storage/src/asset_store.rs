//! Object storage for encoded assets (local filesystem or MinIO/S3).

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use object_store::{aws::AmazonS3Builder, local::LocalFileSystem, path::Path, ObjectStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{StorageError, StorageResult};

/// A stored asset being read as a stream of chunks.
pub struct AssetStream {
    /// Total size in bytes.
    pub size: u64,
    pub chunks: BoxStream<'static, StorageResult<Bytes>>,
}

/// Where assets are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageBackend {
    /// A directory on the local filesystem.
    Local { root: PathBuf },
    /// An S3-compatible bucket.
    S3 {
        endpoint: String,
        bucket: String,
        access_key_id: String,
        secret_access_key: String,
        region: String,
        allow_http: bool,
    },
}

/// Configuration for the asset store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(flatten)]
    pub backend: StorageBackend,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local {
                root: PathBuf::from("/var/lib/recon/ply-storage"),
            },
        }
    }
}

impl StorageConfig {
    /// Load configuration from environment variables.
    ///
    /// `STORAGE_BACKEND=s3` selects the bucket backend; anything else uses
    /// the local directory in `STORAGE_ROOT`.
    pub fn from_env() -> Self {
        let backend = std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "local".to_string());
        if backend.eq_ignore_ascii_case("s3") {
            return Self {
                backend: StorageBackend::S3 {
                    endpoint: std::env::var("S3_ENDPOINT")
                        .unwrap_or_else(|_| "http://minio:9000".to_string()),
                    bucket: std::env::var("S3_BUCKET")
                        .unwrap_or_else(|_| "case-assets".to_string()),
                    access_key_id: std::env::var("S3_ACCESS_KEY")
                        .unwrap_or_else(|_| "minioadmin".to_string()),
                    secret_access_key: std::env::var("S3_SECRET_KEY")
                        .unwrap_or_else(|_| "minioadmin".to_string()),
                    region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                    allow_http: std::env::var("S3_ALLOW_HTTP")
                        .map(|v| v == "true")
                        .unwrap_or(true),
                },
            };
        }

        match std::env::var("STORAGE_ROOT") {
            Ok(root) => Self {
                backend: StorageBackend::Local {
                    root: PathBuf::from(root),
                },
            },
            Err(_) => Self::default(),
        }
    }
}

/// Key builder for the flat asset namespace.
pub struct AssetKey;

impl AssetKey {
    /// Filename for an encoded Gaussian splat.
    /// Format: gaussians_{id}.ply
    pub fn gaussian_ply(id: &str) -> String {
        format!("gaussians_{}.ply", id)
    }

    /// Check that `key` is a single plain filename.
    pub fn validate(key: &str) -> StorageResult<()> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && key.len() <= 255
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if valid {
            Ok(())
        } else {
            Err(StorageError::InvalidKey(key.to_string()))
        }
    }
}

/// Asset store client.
pub struct AssetStorage {
    store: Arc<dyn ObjectStore>,
    location: String,
}

impl AssetStorage {
    /// Create a client from config. Local roots are created if missing.
    pub fn new(config: &StorageConfig) -> StorageResult<Self> {
        match &config.backend {
            StorageBackend::Local { root } => {
                std::fs::create_dir_all(root)?;
                let store = LocalFileSystem::new_with_prefix(root).map_err(|e| {
                    StorageError::Config(format!("Failed to open {}: {}", root.display(), e))
                })?;
                Ok(Self {
                    store: Arc::new(store),
                    location: root.display().to_string(),
                })
            }
            StorageBackend::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
                allow_http,
            } => {
                let mut builder = AmazonS3Builder::new()
                    .with_endpoint(endpoint)
                    .with_bucket_name(bucket)
                    .with_access_key_id(access_key_id)
                    .with_secret_access_key(secret_access_key)
                    .with_region(region);

                if *allow_http {
                    builder = builder.with_allow_http(true);
                }

                let store = builder.build().map_err(|e| {
                    StorageError::Config(format!("Failed to create S3 client: {}", e))
                })?;

                Ok(Self {
                    store: Arc::new(store),
                    location: format!("s3://{}", bucket),
                })
            }
        }
    }

    /// Human-readable backend location.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Write bytes under `key`.
    #[instrument(skip(self, data), fields(store = %self.location, key = %key))]
    pub async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        AssetKey::validate(key)?;
        debug!(size = data.len(), "Writing asset");

        self.store
            .put(&Path::from(key), data.into())
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to write {}: {}", key, e)))?;

        Ok(())
    }

    /// Upload a local file under `key`.
    pub async fn upload_file(&self, key: &str, local: &FsPath) -> StorageResult<u64> {
        let data = tokio::fs::read(local).await?;
        let size = data.len() as u64;
        self.put(key, Bytes::from(data)).await?;
        info!(key = %key, size, store = %self.location, "Uploaded asset");
        Ok(size)
    }

    /// Open the asset under `key` for streaming.
    ///
    /// Only metadata is fetched here; the body is read chunk by chunk as the
    /// returned stream is polled.
    #[instrument(skip(self), fields(store = %self.location, key = %key))]
    pub async fn open(&self, key: &str) -> StorageResult<AssetStream> {
        AssetKey::validate(key)?;

        let result = self.store.get(&Path::from(key)).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => StorageError::NotFound(key.to_string()),
            e => StorageError::Backend(format!("Failed to read {}: {}", key, e)),
        })?;

        let size = result.meta.size as u64;
        debug!(size, "Opened asset");

        let key = key.to_string();
        let chunks = result
            .into_stream()
            .map_err(move |e| StorageError::Backend(format!("Failed to read {}: {}", key, e)))
            .boxed();
        Ok(AssetStream { size, chunks })
    }
}
