//! The external reconstruction model as an injected capability.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use frame_ingest::NormalizedFrame;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use crate::error::PredictError;
use crate::result::PredictionResult;

/// Maps a batch of normalized frames to a model prediction.
///
/// Implementations run to completion; there is no streaming or partial result.
#[async_trait]
pub trait Predictor: Send + Sync {
    /// Model identifier for logs and health output.
    fn name(&self) -> &str;

    async fn predict(&self, frames: &[NormalizedFrame]) -> Result<PredictionResult, PredictError>;
}

/// Connection settings for a remote inference server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// URL accepting the inference POST.
    pub endpoint: String,
    /// Model name reported by the service.
    pub model_name: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/predict".to_string(),
            model_name: "HunyuanWorld-Mirror".to_string(),
            timeout_secs: 300,
        }
    }
}

impl PredictorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: std::env::var("PREDICTOR_ENDPOINT").unwrap_or(defaults.endpoint),
            model_name: std::env::var("PREDICTOR_MODEL_NAME").unwrap_or(defaults.model_name),
            timeout_secs: std::env::var("PREDICTOR_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }
}

/// Calls a model served over HTTP.
///
/// Frames are sent as one `[1, S, 3, H, W]` float32 tensor, base64-encoded
/// little-endian bytes. The response must be a JSON object of tensors.
pub struct HttpPredictor {
    client: reqwest::Client,
    config: PredictorConfig,
}

impl HttpPredictor {
    pub fn new(config: PredictorConfig) -> Result<Self, PredictError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Serialize frames into the request body.
    pub fn request_body(frames: &[NormalizedFrame]) -> Result<Value, PredictError> {
        let first = frames.first().ok_or(PredictError::EmptyBatch)?;
        if let Some(other) = frames.iter().find(|f| f.size != first.size) {
            return Err(PredictError::MixedSizes(first.size, other.size));
        }

        let size = first.size as usize;
        let mut bytes = Vec::with_capacity(frames.len() * first.data.len() * 4);
        for frame in frames {
            for value in &frame.data {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }

        Ok(json!({
            "views": {
                "img": {
                    "shape": [1, frames.len(), 3, size, size],
                    "dtype": "float32",
                    "data_b64": STANDARD.encode(&bytes),
                }
            },
            "cond_flags": [0, 0, 0],
        }))
    }
}

#[async_trait]
impl Predictor for HttpPredictor {
    fn name(&self) -> &str {
        &self.config.model_name
    }

    #[instrument(skip(self, frames), fields(model = %self.config.model_name, frames = frames.len()))]
    async fn predict(&self, frames: &[NormalizedFrame]) -> Result<PredictionResult, PredictError> {
        let body = Self::request_body(frames)?;
        debug!(endpoint = %self.config.endpoint, "Sending inference request");

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PredictError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = response.json().await?;
        let result = PredictionResult::from_json(value).ok_or(PredictError::InvalidResponse)?;
        info!(keys = ?result.keys(), "Inference complete");
        Ok(result)
    }
}
