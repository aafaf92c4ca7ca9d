//! Request orchestration: decode, predict, adapt, encode, store, respond.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use frame_ingest::{
    decode_base64, decode_base64_image, FrameError, FrameSampler, ImageNormalizer,
    NormalizedFrame,
};
use gaussian_ply::write_ply_atomic;
use prediction::{PredictionAdapter, Predictor};
use recon_common::{PipelineConfig, ReconError, ReconResult};
use storage::{AssetKey, AssetStorage};
use tokio::task::JoinError;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::metrics;
use crate::request::ReconstructionInput;
use crate::response::{ReconstructionResponse, RequestStats, ResponseAssembler};

/// One reconstruction pipeline, shared by all requests.
///
/// Holds no per-request state; every request gets its own scratch directory
/// under `work_dir`, named after its request id.
pub struct ReconstructionPipeline {
    predictor: Arc<dyn Predictor>,
    sampler: Arc<FrameSampler>,
    normalizer: ImageNormalizer,
    adapter: PredictionAdapter,
    assembler: ResponseAssembler,
    storage: Arc<AssetStorage>,
    work_dir: PathBuf,
}

fn join_error(err: JoinError) -> ReconError {
    ReconError::Internal(format!("worker task failed: {}", err))
}

fn image_error(index: usize, err: FrameError) -> ReconError {
    match err {
        FrameError::Io(_) => err.into(),
        other => ReconError::Input(format!("Failed to decode images: image {}: {}", index, other)),
    }
}

fn video_error(err: FrameError) -> ReconError {
    match err {
        FrameError::Io(_) => err.into(),
        other => ReconError::Input(format!("Failed to process video input: {}", other)),
    }
}

/// Decode the request payload into normalized model input.
///
/// Each frame is resized as soon as it is decoded; full-resolution rasters
/// are never collected.
fn prepare_frames(
    sampler: &FrameSampler,
    normalizer: &ImageNormalizer,
    input: ReconstructionInput,
    request_id: &str,
) -> ReconResult<Vec<NormalizedFrame>> {
    match input {
        ReconstructionInput::Video(payload) => {
            let bytes = decode_base64(&payload).map_err(video_error)?;
            sampler
                .sample(&bytes, request_id, |frame| normalizer.normalize(frame))
                .map_err(video_error)
        }
        ReconstructionInput::Images(payloads) => normalizer.normalize_batch(&payloads, |i, p| {
            decode_base64_image(p).map_err(|e| image_error(i, e))
        }),
    }
}

impl ReconstructionPipeline {
    pub fn new(
        predictor: Arc<dyn Predictor>,
        sampler: FrameSampler,
        adapter: PredictionAdapter,
        storage: Arc<AssetStorage>,
        work_dir: impl Into<PathBuf>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            predictor,
            sampler: Arc::new(sampler),
            normalizer: ImageNormalizer::new(config),
            adapter,
            assembler: ResponseAssembler::new(config),
            storage,
            work_dir: work_dir.into(),
        }
    }

    /// Name of the model behind this pipeline.
    pub fn model_name(&self) -> &str {
        self.predictor.name()
    }

    /// Run one reconstruction to completion.
    #[instrument(
        skip(self, input),
        fields(request_id = %request_id, case_id = %case_id, input_type = input.input_type().as_str())
    )]
    pub async fn run(
        &self,
        request_id: &str,
        case_id: &str,
        input: ReconstructionInput,
    ) -> ReconResult<ReconstructionResponse> {
        let result = self.run_stages(request_id, input).await;
        if let Err(e) = &result {
            error!(kind = e.kind(), error = %e, "Reconstruction failed");
        }
        result
    }

    async fn run_stages(
        &self,
        request_id: &str,
        input: ReconstructionInput,
    ) -> ReconResult<ReconstructionResponse> {
        let started = Instant::now();
        let input_type = input.input_type();

        // Decode and normalize on the blocking pool
        let frames = {
            let sampler = Arc::clone(&self.sampler);
            let normalizer = self.normalizer.clone();
            let request_id = request_id.to_string();
            tokio::task::spawn_blocking(move || {
                prepare_frames(&sampler, &normalizer, input, &request_id)
            })
            .await
            .map_err(join_error)??
        };
        let input_frames = frames.len();
        info!(
            frames = input_frames,
            size = self.normalizer.size(),
            "Prepared model input"
        );

        let prediction = self.predictor.predict(&frames).await?;
        drop(frames);

        let set = Arc::new(self.adapter.adapt(&prediction)?);
        drop(prediction);

        tokio::fs::create_dir_all(&self.work_dir).await?;
        let scratch = tempfile::Builder::new()
            .prefix(&format!("{}_", request_id))
            .tempdir_in(&self.work_dir)?;
        let filename = AssetKey::gaussian_ply(&Uuid::new_v4().to_string());
        let local_path = scratch.path().join(&filename);

        // The file encoder and the response summary read the same arrays
        let encode = {
            let set = Arc::clone(&set);
            let path = local_path.clone();
            tokio::task::spawn_blocking(move || write_ply_atomic(&set, &path))
        };
        let summarize = {
            let set = Arc::clone(&set);
            let assembler = self.assembler.clone();
            tokio::task::spawn_blocking(move || assembler.summarize(&set))
        };
        let (encoded, summary) = tokio::join!(encode, summarize);
        let bytes = encoded.map_err(join_error)??;
        let summary = summary.map_err(join_error)?;
        info!(points = set.len(), bytes, file = %filename, "Encoded Gaussian PLY");

        let gaussian_asset_key = match self.storage.upload_file(&filename, &local_path).await {
            Ok(_) => Some(filename),
            Err(e) => {
                warn!(
                    error = %e,
                    file = %filename,
                    store = %self.storage.location(),
                    "Failed to persist PLY, responding without asset key"
                );
                metrics::record_storage_failure();
                None
            }
        };
        drop(scratch);

        let elapsed = started.elapsed();
        metrics::record_points(summary.total_points);
        metrics::record_processing_time(elapsed);

        let response = self.assembler.assemble(
            summary,
            gaussian_asset_key,
            RequestStats {
                input_frames,
                processing_time_ms: elapsed.as_millis() as u64,
                input_type,
            },
        );

        info!(
            points = response.processing_stats.point_count,
            sent = response.point_cloud.count,
            elapsed_ms = response.processing_stats.processing_time_ms,
            asset = ?response.gaussian_asset_key,
            "Reconstruction complete"
        );
        Ok(response)
    }
}
