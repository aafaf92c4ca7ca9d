//! Generators for synthetic model outputs.
//!
//! Values follow simple closed forms so tests can check any point
//! without storing expected arrays.

use prediction::{SplatHeadOutput, Tensor};

/// Point `i` of a synthetic cloud.
///
/// Points walk a 10 x 10 x k lattice with unit spacing: `[i % 10, (i / 10) % 10, i / 100]`.
pub fn lattice_point(i: usize) -> [f32; 3] {
    [(i % 10) as f32, ((i / 10) % 10) as f32, (i / 100) as f32]
}

/// Flattened positions for `n` lattice points.
pub fn lattice_positions(n: usize) -> Vec<f32> {
    (0..n).flat_map(lattice_point).collect()
}

/// Per-point opacity: `i / n` in `[0, 1)`.
pub fn ramp_opacity(n: usize) -> Vec<f32> {
    (0..n).map(|i| i as f32 / n.max(1) as f32).collect()
}

/// An attribute-style result mirroring a splat prediction head.
pub fn splat_head(n: usize) -> SplatHeadOutput {
    SplatHeadOutput {
        means: Some(Tensor::from_f32(&[1, n, 3], lattice_positions(n))),
        opacities: Some(Tensor::from_f32(&[1, n], ramp_opacity(n))),
        scales: Some(Tensor::from_f32(&[1, n, 3], vec![-3.0; n * 3])),
        rotations: Some(Tensor::from_f32(&[1, n, 4], [1.0f32, 0.0, 0.0, 0.0].repeat(n))),
        sh: Some(Tensor::from_f32(&[1, n, 1, 3], vec![0.0; n * 3])),
    }
}
