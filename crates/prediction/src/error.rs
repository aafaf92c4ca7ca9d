//! Error types for the model boundary.

use recon_common::ReconError;
use thiserror::Error;

use crate::aliases::CanonicalField;

/// Malformed tensor payloads.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TensorError {
    #[error("shape {shape:?} holds {expected} elements, data has {actual}")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    #[error("ragged array: expected length {expected} at depth {depth}, found {actual}")]
    Ragged {
        depth: usize,
        expected: usize,
        actual: usize,
    },

    #[error("non-numeric value: {0}")]
    NonNumeric(String),
}

/// Failures while adapting model output into canonical arrays.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    /// A mandatory field resolved under none of its aliases.
    #[error("Model did not produce point positions ({aliases})")]
    MissingPositions { aliases: String },

    /// The position array is empty.
    #[error("Model produced zero points")]
    NoPoints,

    /// The winning alias is present but its value is not a numeric tensor.
    #[error("{field} (from '{alias}') is not a numeric tensor: {source}")]
    Malformed {
        field: CanonicalField,
        alias: String,
        source: TensorError,
    },

    /// A field resolved but cannot be viewed as `(N, k)`.
    #[error("{field} (from '{alias}') has {numel} values, cannot reshape to ({points}, {width})")]
    Shape {
        field: CanonicalField,
        alias: String,
        numel: usize,
        points: usize,
        width: String,
    },
}

impl From<AdapterError> for ReconError {
    fn from(err: AdapterError) -> Self {
        ReconError::ModelOutput(err.to_string())
    }
}

/// Failures calling the external model.
#[derive(Error, Debug)]
pub enum PredictError {
    #[error("no frames to predict on")]
    EmptyBatch,

    #[error("frames have mixed sizes: {0} and {1}")]
    MixedSizes(u32, u32),

    #[error("request to model endpoint failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model response is not a JSON object")]
    InvalidResponse,
}

impl From<PredictError> for ReconError {
    fn from(err: PredictError) -> Self {
        ReconError::Inference(err.to_string())
    }
}
