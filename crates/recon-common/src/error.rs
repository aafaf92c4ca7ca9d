//! Error taxonomy for the reconstruction pipeline.

use thiserror::Error;

/// Result type alias using ReconError.
pub type ReconResult<T> = Result<T, ReconError>;

/// Primary error type surfaced by the reconstruction service.
#[derive(Debug, Error)]
pub enum ReconError {
    // === Client Errors ===
    /// Malformed or undecodable request payload.
    #[error("{0}")]
    Input(String),

    /// Requested artifact does not exist.
    #[error("{0}")]
    NotFound(String),

    // === Processing Errors ===
    /// A mandatory canonical field could not be resolved from the model output.
    #[error("{0}")]
    ModelOutput(String),

    /// The external model call itself failed.
    #[error("Model inference failed: {0}")]
    Inference(String),

    /// Shape mismatch while writing the point-cloud file.
    #[error("Failed to write PLY: {0}")]
    Encode(String),

    /// Persisting the encoded file failed.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ReconError {
    /// Short machine-readable name for logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ReconError::Input(_) => "input",
            ReconError::NotFound(_) => "not_found",
            ReconError::ModelOutput(_) => "model_output",
            ReconError::Inference(_) => "inference",
            ReconError::Encode(_) => "encode",
            ReconError::Storage(_) => "storage",
            ReconError::Internal(_) => "internal",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            ReconError::Input(_) => 400,
            ReconError::NotFound(_) => 404,
            _ => 500,
        }
    }
}

impl From<std::io::Error> for ReconError {
    fn from(err: std::io::Error) -> Self {
        ReconError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ReconError {
    fn from(err: serde_json::Error) -> Self {
        ReconError::Input(format!("Invalid JSON body: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ReconError::Input("x".into()).http_status_code(), 400);
        assert_eq!(ReconError::NotFound("x".into()).http_status_code(), 404);
        assert_eq!(ReconError::ModelOutput("x".into()).http_status_code(), 500);
        assert_eq!(ReconError::Encode("x".into()).http_status_code(), 500);
        assert_eq!(ReconError::Storage("x".into()).http_status_code(), 500);
        assert_eq!(ReconError::Inference("x".into()).http_status_code(), 500);
    }

    #[test]
    fn test_input_message_is_passed_through() {
        let err = ReconError::Input("case_id is required".into());
        assert_eq!(err.to_string(), "case_id is required");
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_json_error_is_input_error() {
        let err: ReconError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), "input");
    }
}
