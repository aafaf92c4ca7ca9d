//! Axis-aligned bounds and centroid of a point set.

use serde::{Deserialize, Serialize};

/// Per-axis extent and mean of a set of 3D points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointBounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
    pub centroid: [f32; 3],
}

impl PointBounds {
    /// Compute bounds over `points`. Returns `None` for an empty slice.
    ///
    /// The centroid is accumulated in f64 to keep large clouds stable.
    pub fn from_points(points: &[[f32; 3]]) -> Option<Self> {
        let first = points.first()?;
        let mut min = *first;
        let mut max = *first;
        let mut sum = [0.0f64; 3];

        for p in points {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
                sum[axis] += p[axis] as f64;
            }
        }

        let n = points.len() as f64;
        Some(Self {
            min,
            max,
            centroid: sum.map(|s| (s / n) as f32),
        })
    }
}
