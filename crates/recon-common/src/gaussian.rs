//! Canonical Gaussian splat parameters.
//!
//! A [`GaussianSet`] holds one row per point. Every stage downstream of the
//! prediction adapter (PLY encoding, response assembly) reads from the same
//! set, so the per-point arrays must agree on their length `N`.

use std::borrow::Cow;

use thiserror::Error;

/// Zeroth-order spherical harmonic basis constant.
pub const SH_C0: f64 = 0.282_094_791_773_878_14;

/// Opacity used when the model reports none.
pub const DEFAULT_OPACITY: f32 = 0.8;

/// Log-scale used per axis when the model reports none.
pub const DEFAULT_LOG_SCALE: f32 = -5.0;

/// Identity quaternion in (w, x, y, z) order.
pub const IDENTITY_ROTATION: [f32; 4] = [1.0, 0.0, 0.0, 0.0];

/// Width of the fallback color coefficient vector (DC only, one per channel).
pub const DEFAULT_COLOR_WIDTH: usize = 3;

/// Array length disagreement between fields of a [`GaussianSet`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("{field} has {actual} rows, expected {expected}")]
    RowCount {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("color coefficients have {len} values, not a multiple of width {width} x {points} points")]
    ColorLength {
        len: usize,
        width: usize,
        points: usize,
    },

    #[error("color coefficient width must be positive")]
    ZeroColorWidth,
}

/// Flattened per-point spherical-harmonic coefficients, row-major `(N, width)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorCoeffs {
    pub width: usize,
    pub values: Vec<f32>,
}

/// How a coefficient row maps onto the three color channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorLayout {
    /// Coefficients per channel (`K`).
    pub per_channel: usize,
    /// The raw row is a single shared vector replicated across channels.
    pub replicated: bool,
}

impl ColorLayout {
    /// Number of `f_rest_*` properties (`3 * (K - 1)`).
    pub fn rest_count(&self) -> usize {
        3 * (self.per_channel - 1)
    }
}

impl ColorCoeffs {
    /// All-zero DC coefficients for `n` points.
    pub fn zeros(n: usize) -> Self {
        Self {
            width: DEFAULT_COLOR_WIDTH,
            values: vec![0.0; n * DEFAULT_COLOR_WIDTH],
        }
    }

    /// Channel layout for this width.
    ///
    /// Widths divisible by 3 split into three equal groups. Any other width is
    /// treated as one shared vector that is tiled across all three channels,
    /// so each group is the full row and `K == width`.
    pub fn layout(&self) -> ColorLayout {
        if self.width % 3 == 0 {
            ColorLayout {
                per_channel: self.width / 3,
                replicated: false,
            }
        } else {
            ColorLayout {
                per_channel: self.width,
                replicated: true,
            }
        }
    }

    /// Raw coefficient row for point `i`.
    pub fn row(&self, i: usize) -> &[f32] {
        &self.values[i * self.width..(i + 1) * self.width]
    }

    /// Coefficient row for point `i`, laid out as three channel groups of `K`.
    pub fn channel_row(&self, i: usize) -> Cow<'_, [f32]> {
        let row = self.row(i);
        if self.layout().replicated {
            Cow::Owned(row.repeat(3))
        } else {
            Cow::Borrowed(row)
        }
    }

    /// DC term per channel for point `i`: columns `{0, K, 2K}` of the channel row.
    pub fn dc(&self, i: usize) -> [f32; 3] {
        let row = self.row(i);
        let layout = self.layout();
        if layout.replicated {
            [row[0]; 3]
        } else {
            let k = layout.per_channel;
            [row[0], row[k], row[2 * k]]
        }
    }
}

/// Convert a DC coefficient triple to RGB in `[0, 1]`.
pub fn sh_dc_to_rgb(dc: [f32; 3]) -> [f32; 3] {
    dc.map(|c| (c as f64 * SH_C0 + 0.5).clamp(0.0, 1.0) as f32)
}

/// The canonical Gaussian parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianSet {
    /// World-space centers.
    pub positions: Vec<[f32; 3]>,
    /// Opacity, raw or logit; stored as given.
    pub opacity: Vec<f32>,
    /// Per-axis log-scale.
    pub scales: Vec<[f32; 3]>,
    /// Rotation quaternion (w, x, y, z).
    pub rotations: Vec<[f32; 4]>,
    /// Spherical-harmonic color coefficients.
    pub colors: ColorCoeffs,
}

impl GaussianSet {
    /// Build a set from positions alone, filling every other field with its default.
    pub fn with_defaults(positions: Vec<[f32; 3]>) -> Self {
        let n = positions.len();
        Self {
            positions,
            opacity: vec![DEFAULT_OPACITY; n],
            scales: vec![[DEFAULT_LOG_SCALE; 3]; n],
            rotations: vec![IDENTITY_ROTATION; n],
            colors: ColorCoeffs::zeros(n),
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Check every per-point array against `N`.
    pub fn validate(&self) -> Result<(), ShapeError> {
        let n = self.len();
        check_rows("opacity", n, self.opacity.len())?;
        check_rows("scale", n, self.scales.len())?;
        check_rows("rotation", n, self.rotations.len())?;

        if self.colors.width == 0 {
            return Err(ShapeError::ZeroColorWidth);
        }
        if self.colors.values.len() != n * self.colors.width {
            return Err(ShapeError::ColorLength {
                len: self.colors.values.len(),
                width: self.colors.width,
                points: n,
            });
        }
        Ok(())
    }

    /// RGB color for point `i` derived from its DC term.
    pub fn rgb(&self, i: usize) -> [f32; 3] {
        sh_dc_to_rgb(self.colors.dc(i))
    }
}

fn check_rows(field: &'static str, expected: usize, actual: usize) -> Result<(), ShapeError> {
    if expected != actual {
        return Err(ShapeError::RowCount {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}
