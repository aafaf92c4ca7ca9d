//! Immutable pipeline configuration.

use serde::{Deserialize, Serialize};

/// Model input resolution (square).
pub const DEFAULT_TARGET_SIZE: u32 = 518;

/// Frames sampled per second of video.
pub const DEFAULT_TARGET_FPS: f64 = 1.0;

/// Assumed source frame rate when the container does not report one.
pub const DEFAULT_SOURCE_FPS: f64 = 30.0;

/// Hard cap on frames extracted from a single video.
pub const DEFAULT_MAX_FRAMES: usize = 100;

/// Cap on points returned inline in the JSON response.
pub const DEFAULT_MAX_RESPONSE_POINTS: usize = 50_000;

/// Seed for response downsampling.
pub const DEFAULT_SAMPLE_SEED: u64 = 42;

/// Tunables shared by every pipeline stage.
///
/// Built once at startup and handed to each component by value or reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Side length of the normalized model input.
    pub target_size: u32,

    /// Video sampling rate in frames per second.
    pub target_fps: f64,

    /// Fallback source frame rate.
    pub default_source_fps: f64,

    /// Maximum frames taken from a video.
    pub max_frames: usize,

    /// Maximum points in the transport payload.
    pub max_response_points: usize,

    /// RNG seed for transport downsampling.
    pub sample_seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            target_fps: DEFAULT_TARGET_FPS,
            default_source_fps: DEFAULT_SOURCE_FPS,
            max_frames: DEFAULT_MAX_FRAMES,
            max_response_points: DEFAULT_MAX_RESPONSE_POINTS,
            sample_seed: DEFAULT_SAMPLE_SEED,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("RECON_TARGET_SIZE") {
            if let Ok(size) = val.parse() {
                config.target_size = size;
            }
        }

        if let Ok(val) = std::env::var("RECON_TARGET_FPS") {
            if let Ok(fps) = val.parse() {
                config.target_fps = fps;
            }
        }

        if let Ok(val) = std::env::var("RECON_DEFAULT_SOURCE_FPS") {
            if let Ok(fps) = val.parse() {
                config.default_source_fps = fps;
            }
        }

        if let Ok(val) = std::env::var("RECON_MAX_FRAMES") {
            if let Ok(max) = val.parse() {
                config.max_frames = max;
            }
        }

        if let Ok(val) = std::env::var("RECON_MAX_RESPONSE_POINTS") {
            if let Ok(max) = val.parse() {
                config.max_response_points = max;
            }
        }

        if let Ok(val) = std::env::var("RECON_SAMPLE_SEED") {
            if let Ok(seed) = val.parse() {
                config.sample_seed = seed;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.target_size == 0 {
            return Err("target_size must be positive".to_string());
        }
        if !(self.target_fps.is_finite() && self.target_fps > 0.0) {
            return Err(format!("target_fps must be positive, got {}", self.target_fps));
        }
        if !(self.default_source_fps.is_finite() && self.default_source_fps > 0.0) {
            return Err(format!(
                "default_source_fps must be positive, got {}",
                self.default_source_fps
            ));
        }
        if self.max_frames == 0 {
            return Err("max_frames must be at least 1".to_string());
        }
        if self.max_response_points == 0 {
            return Err("max_response_points must be at least 1".to_string());
        }
        Ok(())
    }
}
