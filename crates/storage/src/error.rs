//! Error types for asset storage.

use recon_common::ReconError;
use thiserror::Error;

/// Errors from the asset store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// No object exists under the key.
    #[error("asset not found: {0}")]
    NotFound(String),

    /// Key is not a plain filename.
    #[error("invalid asset key: {0}")]
    InvalidKey(String),

    /// The backend could not be configured.
    #[error("storage configuration error: {0}")]
    Config(String),

    /// The backend rejected or failed an operation.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Reading a local file for upload failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for ReconError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => ReconError::NotFound(err.to_string()),
            StorageError::InvalidKey(_) => ReconError::Input(err.to_string()),
            other => ReconError::Storage(other.to_string()),
        }
    }
}
