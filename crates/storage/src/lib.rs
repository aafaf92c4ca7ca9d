//! Storage for encoded point-cloud assets.
//!
//! Assets live in a flat namespace keyed by filename only, on either the
//! local filesystem or an S3-compatible bucket.

pub mod asset_store;
pub mod error;

pub use asset_store::{AssetKey, AssetStorage, AssetStream, StorageBackend, StorageConfig};
pub use error::{StorageError, StorageResult};
