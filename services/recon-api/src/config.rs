//! Service configuration loading and types.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use prediction::{AliasTable, PredictorConfig};
use recon_common::PipelineConfig;
use serde::{Deserialize, Serialize};
use storage::StorageConfig;

/// Default request body limit (base64 video payloads are large).
pub const DEFAULT_MAX_BODY_MB: usize = 512;

/// Top-level configuration for the reconstruction service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Socket address to listen on.
    pub listen: String,

    /// Scratch directory for staged videos and encoded files.
    pub work_dir: PathBuf,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,

    /// ffmpeg executable used to decode video.
    pub ffmpeg_path: PathBuf,

    /// ffprobe executable used to read stream metadata.
    pub ffprobe_path: PathBuf,

    pub pipeline: PipelineConfig,
    pub predictor: PredictorConfig,
    pub storage: StorageConfig,

    /// Output key aliases, highest priority first.
    pub aliases: AliasTable,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8090".to_string(),
            work_dir: std::env::temp_dir().join("recon"),
            max_body_bytes: DEFAULT_MAX_BODY_MB * 1024 * 1024,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            pipeline: PipelineConfig::default(),
            predictor: PredictorConfig::default(),
            storage: StorageConfig::default(),
            aliases: AliasTable::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            listen: std::env::var("RECON_LISTEN_ADDR").unwrap_or(defaults.listen),
            work_dir: std::env::var("RECON_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            max_body_bytes: std::env::var("RECON_MAX_BODY_MB")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .map(|mb| mb * 1024 * 1024)
                .unwrap_or(defaults.max_body_bytes),
            ffmpeg_path: std::env::var("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffmpeg_path),
            ffprobe_path: std::env::var("FFPROBE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffprobe_path),
            pipeline: PipelineConfig::from_env(),
            predictor: PredictorConfig::from_env(),
            storage: StorageConfig::from_env(),
            aliases: defaults.aliases,
        }
    }

    /// Load configuration from a YAML file. Missing keys take defaults.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {:?}", path))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse: {:?}", path))?;
        tracing::info!(path = ?path, "Loaded service configuration");
        Ok(config)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.pipeline
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid pipeline config: {}", e))?;

        if self.max_body_bytes == 0 {
            anyhow::bail!("max_body_bytes must be positive");
        }
        if self.aliases.positions.is_empty() {
            anyhow::bail!("at least one position alias is required");
        }
        Ok(())
    }
}
