//! Error types for input decoding.

use recon_common::ReconError;
use thiserror::Error;

/// Errors raised while turning request payloads into frames.
#[derive(Error, Debug)]
pub enum FrameError {
    /// Payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    Base64(String),

    /// Bytes could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    ImageDecode(String),

    /// The video container or stream could not be opened.
    #[error("could not open video: {0}")]
    VideoOpen(String),

    /// Reading a frame from an opened video failed.
    #[error("video decode failed: {0}")]
    VideoDecode(String),

    /// The video opened but produced no frames.
    #[error("No frames could be extracted from video")]
    NoFrames,

    /// Pixel buffer does not match its declared dimensions.
    #[error("frame buffer has {actual} bytes, expected {expected} for {width}x{height}")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// Scratch file handling failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for frame operations.
pub type FrameResult<T> = Result<T, FrameError>;

impl From<FrameError> for ReconError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Io(e) => ReconError::Internal(e.to_string()),
            other => ReconError::Input(other.to_string()),
        }
    }
}
