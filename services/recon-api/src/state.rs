//! Application state for the reconstruction API.

use std::sync::Arc;

use anyhow::{Context, Result};
use frame_ingest::{FfmpegDecoder, FrameSampler, VideoDecoder};
use metrics_exporter_prometheus::PrometheusHandle;
use prediction::{HttpPredictor, PredictionAdapter, Predictor};
use storage::AssetStorage;
use tracing::info;

use crate::config::ServiceConfig;
use crate::pipeline::ReconstructionPipeline;

/// Shared application state.
pub struct AppState {
    pub config: ServiceConfig,

    /// Reconstruction pipeline shared by all requests.
    pub pipeline: ReconstructionPipeline,

    /// Store holding encoded PLY files.
    pub storage: Arc<AssetStorage>,

    /// Prometheus renderer, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create state backed by the HTTP model client and ffmpeg.
    pub fn new(config: ServiceConfig, metrics: Option<PrometheusHandle>) -> Result<Self> {
        config.validate()?;

        let predictor = HttpPredictor::new(config.predictor.clone())
            .context("Failed to create model client")?;
        let decoder = FfmpegDecoder::new(config.ffmpeg_path.clone(), config.ffprobe_path.clone());
        let storage = AssetStorage::new(&config.storage).context("Failed to open asset storage")?;

        info!(
            model = %config.predictor.model_name,
            endpoint = %config.predictor.endpoint,
            store = %storage.location(),
            work_dir = %config.work_dir.display(),
            "Initialized reconstruction pipeline"
        );

        Ok(Self::with_components(
            config,
            Arc::new(predictor),
            Arc::new(decoder),
            storage,
            metrics,
        ))
    }

    /// Assemble state from explicit components.
    pub fn with_components(
        config: ServiceConfig,
        predictor: Arc<dyn Predictor>,
        decoder: Arc<dyn VideoDecoder>,
        storage: AssetStorage,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let storage = Arc::new(storage);
        let sampler = FrameSampler::new(decoder, config.work_dir.clone(), &config.pipeline);
        let pipeline = ReconstructionPipeline::new(
            predictor,
            sampler,
            PredictionAdapter::new(config.aliases.clone()),
            Arc::clone(&storage),
            config.work_dir.clone(),
            &config.pipeline,
        );

        Self {
            config,
            pipeline,
            storage,
            metrics,
        }
    }
}
