//! Canonicalization of model output into a [`GaussianSet`].

use recon_common::{ColorCoeffs, GaussianSet};
use tracing::{debug, info};

use crate::aliases::{AliasTable, CanonicalField};
use crate::error::AdapterError;
use crate::result::PredictionResult;

/// Resolves canonical fields from a [`PredictionResult`] through an [`AliasTable`].
///
/// Positions are mandatory. Every other field falls back to the documented
/// default from [`GaussianSet::with_defaults`] when no alias resolves.
#[derive(Debug, Clone, Default)]
pub struct PredictionAdapter {
    aliases: AliasTable,
}

/// A resolved field flattened to f32.
struct Resolved<'a> {
    field: CanonicalField,
    alias: &'a str,
    values: Vec<f32>,
}

impl Resolved<'_> {
    fn shape_error(&self, points: usize, width: impl Into<String>) -> AdapterError {
        AdapterError::Shape {
            field: self.field,
            alias: self.alias.to_string(),
            numel: self.values.len(),
            points,
            width: width.into(),
        }
    }

    /// View as `(n, k)` with `k` fixed.
    fn rows<const K: usize>(self, n: usize) -> Result<Vec<[f32; K]>, AdapterError> {
        if self.values.len() != n * K {
            return Err(self.shape_error(n, K.to_string()));
        }
        Ok(self
            .values
            .chunks_exact(K)
            .map(|c| {
                let mut row = [0.0; K];
                row.copy_from_slice(c);
                row
            })
            .collect())
    }

    /// Width of an `(n, -1)` view.
    fn free_width(&self, n: usize) -> Result<usize, AdapterError> {
        let numel = self.values.len();
        if n == 0 || numel == 0 || numel % n != 0 {
            return Err(self.shape_error(n, "-1"));
        }
        Ok(numel / n)
    }
}

impl PredictionAdapter {
    pub fn new(aliases: AliasTable) -> Self {
        Self { aliases }
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// The field under its first present alias. A malformed value there is an
    /// error; later aliases are not consulted.
    fn resolve<'a>(
        &'a self,
        result: &'a PredictionResult,
        field: CanonicalField,
    ) -> Result<Option<Resolved<'a>>, AdapterError> {
        let Some((alias, entry)) = result.resolve(self.aliases.aliases(field)) else {
            return Ok(None);
        };
        let tensor = entry.map_err(|e| AdapterError::Malformed {
            field,
            alias: alias.to_string(),
            source: e.clone(),
        })?;
        debug!(field = %field, alias = %alias, shape = ?tensor.shape(), "Resolved output field");
        Ok(Some(Resolved {
            field,
            alias,
            values: tensor.to_f32_vec(),
        }))
    }

    /// Materialize the canonical Gaussian set.
    pub fn adapt(&self, result: &PredictionResult) -> Result<GaussianSet, AdapterError> {
        let positions = self
            .resolve(result, CanonicalField::Positions)?
            .ok_or_else(|| AdapterError::MissingPositions {
                aliases: self.aliases.positions.join(", "),
            })?;

        if positions.values.is_empty() {
            return Err(AdapterError::NoPoints);
        }
        if positions.values.len() % 3 != 0 {
            let n = positions.values.len() / 3;
            return Err(positions.shape_error(n, "3"));
        }
        let n = positions.values.len() / 3;
        let mut set = GaussianSet::with_defaults(positions.rows::<3>(n)?);

        if let Some(opacity) = self.resolve(result, CanonicalField::Opacity)? {
            // Extra channels (e.g. per-view confidence) are dropped; the first column is kept
            let width = opacity.free_width(n)?;
            set.opacity = opacity.values.iter().step_by(width).copied().collect();
        }

        if let Some(scale) = self.resolve(result, CanonicalField::Scale)? {
            set.scales = scale.rows::<3>(n)?;
        }

        if let Some(rotation) = self.resolve(result, CanonicalField::Rotation)? {
            set.rotations = rotation.rows::<4>(n)?;
        }

        if let Some(color) = self.resolve(result, CanonicalField::Color)? {
            let width = color.free_width(n)?;
            set.colors = ColorCoeffs {
                width,
                values: color.values,
            };
        }

        info!(
            points = n,
            color_width = set.colors.width,
            "Extracted Gaussian parameters"
        );
        Ok(set)
    }
}
