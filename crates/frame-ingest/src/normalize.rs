//! Resizing frames to the fixed model input.

use image::imageops::{self, FilterType};
use image::RgbImage;
use rayon::prelude::*;
use recon_common::PipelineConfig;

use crate::error::{FrameError, FrameResult};
use crate::frame::{NormalizedFrame, RasterFrame};

/// Resizes any [`RasterFrame`] to a `size x size` planar float tensor.
///
/// Video frames and uploaded images take the same path, so the model sees
/// identical preprocessing for both.
#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    size: u32,
}

impl ImageNormalizer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            size: config.target_size,
        }
    }

    /// Output side length.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Lanczos-resize one frame and scale to `[0, 1]`.
    ///
    /// Takes the frame by value; the full-resolution buffer is released as
    /// soon as the resized copy exists.
    pub fn normalize(&self, frame: RasterFrame) -> FrameResult<NormalizedFrame> {
        let (width, height) = (frame.width, frame.height);
        let actual = frame.data.len();
        let src = RgbImage::from_raw(width, height, frame.data).ok_or(FrameError::BufferSize {
            width,
            height,
            expected: width as usize * height as usize * 3,
            actual,
        })?;

        let resized = if width == self.size && height == self.size {
            src
        } else {
            imageops::resize(&src, self.size, self.size, FilterType::Lanczos3)
        };

        let plane = self.size as usize * self.size as usize;
        let mut data = vec![0.0f32; plane * 3];
        for (i, px) in resized.pixels().enumerate() {
            data[i] = px[0] as f32 / 255.0;
            data[plane + i] = px[1] as f32 / 255.0;
            data[2 * plane + i] = px[2] as f32 / 255.0;
        }

        Ok(NormalizedFrame {
            size: self.size,
            data,
        })
    }

    /// Load and normalize a batch in parallel, preserving order.
    ///
    /// `load` turns item `i` into a full-resolution frame, which is resized
    /// right away, so at most one raster per worker is alive at a time.
    pub fn normalize_batch<T, E, F>(&self, items: &[T], load: F) -> Result<Vec<NormalizedFrame>, E>
    where
        T: Sync,
        E: From<FrameError> + Send,
        F: Fn(usize, &T) -> Result<RasterFrame, E> + Sync,
    {
        items
            .par_iter()
            .enumerate()
            .map(|(i, item)| {
                let frame = load(i, item)?;
                Ok(self.normalize(frame)?)
            })
            .collect()
    }
}
