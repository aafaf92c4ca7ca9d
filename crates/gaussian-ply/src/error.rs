//! Error types for PLY encoding and decoding.

use recon_common::{ReconError, ShapeError};
use thiserror::Error;

/// Errors that can occur while writing or reading a splat PLY file.
#[derive(Error, Debug)]
pub enum PlyError {
    /// Per-point arrays disagree on their length.
    #[error("shape mismatch: {0}")]
    Shape(#[from] ShapeError),

    /// Writing or reading the underlying file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The header is missing, malformed, or declares an unsupported format.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The body is shorter than the header promises.
    #[error("truncated body: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },
}

/// Result type for PLY operations.
pub type PlyResult<T> = Result<T, PlyError>;

impl From<PlyError> for ReconError {
    fn from(err: PlyError) -> Self {
        ReconError::Encode(err.to_string())
    }
}
