//! Frame buffer types.

use crate::error::{FrameError, FrameResult};

/// Byte order of a three-channel pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelOrder {
    Rgb,
    Bgr,
}

/// A decoded 8-bit RGB image, row-major, 3 bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RasterFrame {
    /// Wrap an RGB buffer, checking its length against the dimensions.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> FrameResult<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(FrameError::BufferSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build from a buffer in `order`, converting to RGB.
    pub fn from_ordered(
        width: u32,
        height: u32,
        mut data: Vec<u8>,
        order: PixelOrder,
    ) -> FrameResult<Self> {
        if order == PixelOrder::Bgr {
            for px in data.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
        }
        Self::new(width, height, data)
    }

    /// RGB triple at (x, y).
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

/// A square model input, planar channel-first (`3 x size x size`), values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFrame {
    pub size: u32,
    pub data: Vec<f32>,
}

impl NormalizedFrame {
    /// Tensor shape `[channels, height, width]`.
    pub fn shape(&self) -> [usize; 3] {
        [3, self.size as usize, self.size as usize]
    }

    /// One channel plane.
    pub fn channel(&self, c: usize) -> &[f32] {
        let plane = self.size as usize * self.size as usize;
        &self.data[c * plane..(c + 1) * plane]
    }
}
