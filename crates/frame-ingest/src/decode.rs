//! Base64 and still-image decoding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{FrameError, FrameResult};
use crate::frame::RasterFrame;

/// Decode a base64 payload.
///
/// ASCII whitespace is ignored and an optional `data:<mime>;base64,` prefix
/// is stripped, so payloads pasted from browsers decode unchanged.
pub fn decode_base64(payload: &str) -> FrameResult<Vec<u8>> {
    let body = match payload.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => payload,
    };

    let cleaned: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(FrameError::Base64("payload is empty".to_string()));
    }

    STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| FrameError::Base64(e.to_string()))
}

/// Decode any supported still-image format into an RGB frame.
pub fn decode_image(bytes: &[u8]) -> FrameResult<RasterFrame> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| FrameError::ImageDecode(e.to_string()))?
        .to_rgb8();

    let (width, height) = img.dimensions();
    RasterFrame::new(width, height, img.into_raw())
}

/// Decode a base64-encoded image.
pub fn decode_base64_image(payload: &str) -> FrameResult<RasterFrame> {
    decode_image(&decode_base64(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_base64_plain() {
        assert_eq!(decode_base64("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_base64_with_whitespace_and_prefix() {
        assert_eq!(
            decode_base64("data:image/png;base64,aGVs\nbG8=").unwrap(),
            b"hello"
        );
    }

    #[test]
    fn test_decode_base64_invalid() {
        assert!(matches!(decode_base64("!!!not base64"), Err(FrameError::Base64(_))));
        assert!(matches!(decode_base64("   "), Err(FrameError::Base64(_))));
    }

    #[test]
    fn test_decode_image_garbage() {
        assert!(matches!(
            decode_image(b"definitely not an image"),
            Err(FrameError::ImageDecode(_))
        ));
    }
}
