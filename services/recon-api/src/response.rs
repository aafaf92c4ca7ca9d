//! Response assembly: bounds, transport downsampling, and the JSON contract.

use rand::rngs::StdRng;
use rand::SeedableRng;
use recon_common::{GaussianSet, PipelineConfig, PointBounds};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::request::InputType;

/// Confidence reported for the single reconstructed scene object.
pub const SCENE_CONFIDENCE: f32 = 0.8;

/// Top-level response of `POST /reconstruct`.
///
/// Field names and nesting are consumed verbatim by the case backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionResponse {
    pub objects: Vec<ObjectAction>,
    pub point_cloud: PointCloudPayload,
    pub gaussian_asset_key: Option<String>,
    pub mesh_asset_key: Option<String>,
    pub pointcloud_asset_key: Option<String>,
    pub uncertainty_regions: Vec<Value>,
    pub processing_stats: ProcessingStats,
}

/// A scene-graph edit proposed to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectAction {
    pub id: String,
    pub action: String,
    pub confidence: f32,
    pub object: SceneObject,
    pub source_images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: String,
    #[serde(rename = "type")]
    pub object_type: String,
    pub label: String,
    pub pose: Pose,
    pub bbox: BoundingBox,
    pub state: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

/// Point sample sent inline with the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloudPayload {
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 3]>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub input_images: usize,
    pub detected_objects: usize,
    pub point_count: usize,
    pub processing_time_ms: u64,
    pub input_type: InputType,
}

/// Everything derived from the point set itself.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloudSummary {
    pub bounds: PointBounds,
    pub sample: PointCloudPayload,
    /// True number of points before downsampling.
    pub total_points: usize,
}

/// Request-level facts the summary does not know.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestStats {
    pub input_frames: usize,
    pub processing_time_ms: u64,
    pub input_type: InputType,
}

/// Indices of a uniform sample without replacement, or `None` when `n <= cap`.
///
/// The same `(n, cap, seed)` always selects the same indices in the same order.
pub fn sample_indices(n: usize, cap: usize, seed: u64) -> Option<Vec<usize>> {
    if n <= cap {
        return None;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    Some(rand::seq::index::sample(&mut rng, n, cap).into_vec())
}

/// Builds the response object from a canonical Gaussian set.
#[derive(Debug, Clone)]
pub struct ResponseAssembler {
    max_points: usize,
    seed: u64,
}

impl ResponseAssembler {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            max_points: config.max_response_points,
            seed: config.sample_seed,
        }
    }

    /// Bounds over all points plus a capped transport sample.
    pub fn summarize(&self, set: &GaussianSet) -> PointCloudSummary {
        let total_points = set.len();
        let bounds = PointBounds::from_points(&set.positions).unwrap_or(PointBounds {
            min: [0.0; 3],
            max: [0.0; 3],
            centroid: [0.0; 3],
        });

        let sample = match sample_indices(total_points, self.max_points, self.seed) {
            Some(indices) => {
                debug!(
                    total = total_points,
                    kept = indices.len(),
                    "Downsampled point cloud for response"
                );
                PointCloudPayload {
                    positions: indices.iter().map(|&i| set.positions[i]).collect(),
                    colors: indices.iter().map(|&i| set.rgb(i)).collect(),
                    count: indices.len(),
                }
            }
            None => PointCloudPayload {
                positions: set.positions.clone(),
                colors: (0..total_points).map(|i| set.rgb(i)).collect(),
                count: total_points,
            },
        };

        PointCloudSummary {
            bounds,
            sample,
            total_points,
        }
    }

    /// Assemble the final response. `gaussian_asset_key` is `None` when the
    /// encoded file could not be stored.
    pub fn assemble(
        &self,
        summary: PointCloudSummary,
        gaussian_asset_key: Option<String>,
        stats: RequestStats,
    ) -> ReconstructionResponse {
        let object = SceneObject {
            id: Uuid::new_v4().to_string(),
            object_type: "other".to_string(),
            label: "Reconstructed Scene".to_string(),
            pose: Pose {
                position: summary.bounds.centroid,
                rotation: [1.0, 0.0, 0.0, 0.0],
                scale: [1.0, 1.0, 1.0],
            },
            bbox: BoundingBox {
                min: summary.bounds.min,
                max: summary.bounds.max,
            },
            state: "visible".to_string(),
            confidence: SCENE_CONFIDENCE,
        };

        ReconstructionResponse {
            objects: vec![ObjectAction {
                id: Uuid::new_v4().to_string(),
                action: "create".to_string(),
                confidence: SCENE_CONFIDENCE,
                object,
                source_images: Vec::new(),
            }],
            point_cloud: summary.sample,
            gaussian_asset_key,
            mesh_asset_key: None,
            pointcloud_asset_key: None,
            uncertainty_regions: Vec::new(),
            processing_stats: ProcessingStats {
                input_images: stats.input_frames,
                detected_objects: 1,
                point_count: summary.total_points,
                processing_time_ms: stats.processing_time_ms,
                input_type: stats.input_type,
            },
        }
    }
}
