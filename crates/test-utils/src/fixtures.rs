//! Common test fixtures: encoded images and request bodies.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageOutputFormat, Rgb, RgbImage};
use serde_json::{json, Value};

/// Image sizes used across the suite.
pub mod sizes {
    /// Small square frame, cheap to resample.
    pub const SMALL: (u32, u32) = (64, 64);

    /// Landscape frame with a non-square aspect ratio.
    pub const WIDE: (u32, u32) = (96, 48);

    /// Already at model resolution; normalization skips the resample.
    pub const MODEL: (u32, u32) = (518, 518);
}

/// Creates an RGB image with a predictable gradient.
///
/// Pixel (x, y) is `[x * 4 % 256, y * 4 % 256, 128]`.
pub fn gradient_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 4 % 256) as u8, (y * 4 % 256) as u8, 128])
    })
}

/// Encodes an image in `format` and returns the raw bytes.
pub fn encode_image(img: &RgbImage, format: ImageOutputFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format)
        .expect("in-memory image encode cannot fail");
    buf.into_inner()
}

/// Base64 PNG of a gradient image.
pub fn png_base64(width: u32, height: u32) -> String {
    STANDARD.encode(encode_image(
        &gradient_image(width, height),
        ImageOutputFormat::Png,
    ))
}

/// Base64 JPEG of a gradient image.
pub fn jpeg_base64(width: u32, height: u32) -> String {
    STANDARD.encode(encode_image(
        &gradient_image(width, height),
        ImageOutputFormat::Jpeg(90),
    ))
}

/// PNG wrapped as a browser-style data URL.
pub fn png_data_url(width: u32, height: u32) -> String {
    format!("data:image/png;base64,{}", png_base64(width, height))
}

/// A `/reconstruct` body with `count` small PNG images.
pub fn image_request(case_id: &str, count: usize) -> Value {
    let (w, h) = sizes::SMALL;
    let images: Vec<String> = (0..count).map(|_| png_base64(w, h)).collect();
    json!({
        "case_id": case_id,
        "scan_asset_keys": images,
    })
}

/// A `/reconstruct` body carrying a video payload.
pub fn video_request(case_id: &str, video: &[u8]) -> Value {
    json!({
        "case_id": case_id,
        "video_base64": STANDARD.encode(video),
    })
}
