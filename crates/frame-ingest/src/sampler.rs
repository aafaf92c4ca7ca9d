//! Fixed-rate frame sampling from video payloads.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use recon_common::PipelineConfig;
use tracing::{debug, info};

use crate::error::{FrameError, FrameResult};
use crate::frame::RasterFrame;
use crate::video::{VideoDecoder, VideoStream};

/// Source frames between two emitted frames.
///
/// Falls back to `default_fps` when the source rate is unknown or invalid.
pub fn frame_stride(source_fps: Option<f64>, target_fps: f64, default_fps: f64) -> usize {
    let fps = source_fps
        .filter(|f| f.is_finite() && *f > 0.0)
        .unwrap_or(default_fps);
    let stride = (fps / target_fps).round();
    if stride.is_finite() && stride >= 1.0 {
        stride as usize
    } else {
        1
    }
}

/// Extracts an evenly time-spaced, capped set of RGB frames from a video.
pub struct FrameSampler {
    decoder: Arc<dyn VideoDecoder>,
    work_dir: PathBuf,
    target_fps: f64,
    default_fps: f64,
    max_frames: usize,
}

impl FrameSampler {
    pub fn new(
        decoder: Arc<dyn VideoDecoder>,
        work_dir: impl Into<PathBuf>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            decoder,
            work_dir: work_dir.into(),
            target_fps: config.target_fps,
            default_fps: config.default_source_fps,
            max_frames: config.max_frames,
        }
    }

    /// Decode `video` and pass each sampled frame to `emit` in temporal order.
    ///
    /// `emit` runs before the next frame is decoded, so callers that shrink
    /// frames (e.g. normalization) never hold more than one full-resolution
    /// raster. An error from `emit` stops decoding.
    ///
    /// The payload is staged in a temp file named after `request_id`; it is
    /// removed when this call returns, whatever the outcome.
    pub fn sample<T, F>(&self, video: &[u8], request_id: &str, emit: F) -> FrameResult<Vec<T>>
    where
        F: FnMut(RasterFrame) -> FrameResult<T>,
    {
        std::fs::create_dir_all(&self.work_dir)?;

        let mut staged = tempfile::Builder::new()
            .prefix(&format!("{}_", request_id))
            .suffix("_input.mp4")
            .tempfile_in(&self.work_dir)?;
        staged.write_all(video)?;
        staged.flush()?;

        debug!(
            path = %staged.path().display(),
            bytes = video.len(),
            "Staged video payload"
        );

        let mut stream = self.decoder.open(staged.path())?;
        let frames = self.sample_stream(stream.as_mut(), emit)?;

        info!(
            request_id = %request_id,
            frames = frames.len(),
            "Extracted frames from video"
        );
        Ok(frames)
    }

    /// Walk an opened stream, keeping every stride-th frame up to the cap.
    fn sample_stream<T, F>(&self, stream: &mut dyn VideoStream, mut emit: F) -> FrameResult<Vec<T>>
    where
        F: FnMut(RasterFrame) -> FrameResult<T>,
    {
        let source_fps = stream.fps();
        let stride = frame_stride(source_fps, self.target_fps, self.default_fps);
        debug!(source_fps = ?source_fps, stride, max_frames = self.max_frames, "Sampling video");

        let mut frames = Vec::new();
        let mut index = 0usize;
        while frames.len() < self.max_frames {
            let Some(decoded) = stream.next_frame()? else {
                break;
            };
            if index % stride == 0 {
                let frame = RasterFrame::from_ordered(
                    decoded.width,
                    decoded.height,
                    decoded.data,
                    decoded.order,
                )?;
                frames.push(emit(frame)?);
            }
            index += 1;
        }

        if frames.is_empty() {
            return Err(FrameError::NoFrames);
        }
        Ok(frames)
    }
}
